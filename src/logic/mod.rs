pub mod clock;
pub mod products;
pub mod rules;
pub mod withdrawal;

pub use clock::{Clock, FixedClock, SystemClock};
pub use products::ProductRegistry;
pub use rules::RiskEngine;
pub use withdrawal::{ApplicationRequest, WithdrawalTracker};
