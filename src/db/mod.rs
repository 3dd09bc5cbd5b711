mod connection;
mod migrations;
mod queries;

pub use connection::Database;

use crate::error::Result;
use crate::models::PesticideApplication;

/// Persistence collaborator for the withdrawal tracker. Always reads and
/// writes the whole ordered list.
pub trait ApplicationStore {
    fn load(&self) -> Result<Vec<PesticideApplication>>;

    fn save(&self, applications: &[PesticideApplication]) -> Result<()>;
}
