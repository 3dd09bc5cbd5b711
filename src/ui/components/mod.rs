pub mod gauge;
pub mod input;

pub use gauge::{ProgressBar, WithdrawalGauge};
pub use input::{InputWidget, SelectWidget};
