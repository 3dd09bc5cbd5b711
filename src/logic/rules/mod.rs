pub mod engine;
pub mod leaf_spot;
pub mod powdery_mildew;
pub mod wind_damage;

pub use engine::RiskEngine;

use crate::models::{RiskAlert, WeatherObservation};

/// Trait for weather risk rules
pub trait WeatherRule: Send + Sync {
    /// Stable identifier, used as the alert id prefix
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate one observation; `index` is its position in the forecast
    fn evaluate(&self, observation: &WeatherObservation, index: usize) -> Option<RiskAlert>;
}
