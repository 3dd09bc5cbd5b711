pub mod alert;
pub mod application;
pub mod status;
pub mod weather;

pub use alert::*;
pub use application::*;
pub use status::*;
pub use weather::*;
