use super::WeatherRule;
use crate::models::{RiskAlert, RiskLevel, WeatherObservation};

const RAINFALL_THRESHOLD_MM: f64 = 3.0;
const HUMIDITY_THRESHOLD_PCT: f64 = 75.0;

/// Leaf spot and other splash-dispersed fungal disease.
///
/// Triggers on rainfall above 3mm combined with humidity above 75%.
pub struct LeafSpotRule;

impl WeatherRule for LeafSpotRule {
    fn id(&self) -> &'static str {
        "leaf"
    }

    fn name(&self) -> &'static str {
        "Leaf Spot Disease"
    }

    fn evaluate(&self, observation: &WeatherObservation, index: usize) -> Option<RiskAlert> {
        if observation.rainfall_mm <= RAINFALL_THRESHOLD_MM
            || observation.humidity_pct <= HUMIDITY_THRESHOLD_PCT
        {
            return None;
        }

        Some(
            RiskAlert::new(
                self.id(),
                index,
                RiskLevel::High,
                "Leaf Spot Disease Risk",
                format!(
                    "Heavy rainfall ({:.1}mm) with high humidity ({:.0}%)",
                    observation.rainfall_mm, observation.humidity_pct
                ),
            )
            .for_day(&observation.label)
            .with_action("Improve drainage & avoid water logging"),
        )
    }
}
