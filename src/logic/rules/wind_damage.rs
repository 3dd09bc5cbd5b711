use super::WeatherRule;
use crate::models::{RiskAlert, RiskLevel, WeatherObservation};

const WIND_THRESHOLD_KMH: f64 = 25.0;

pub struct WindDamageRule;

impl WeatherRule for WindDamageRule {
    fn id(&self) -> &'static str {
        "wind"
    }

    fn name(&self) -> &'static str {
        "Wind Damage"
    }

    fn evaluate(&self, observation: &WeatherObservation, index: usize) -> Option<RiskAlert> {
        if observation.wind_speed_kmh <= WIND_THRESHOLD_KMH {
            return None;
        }

        Some(
            RiskAlert::new(
                self.id(),
                index,
                RiskLevel::Medium,
                "Strong Wind Warning",
                format!("Wind speed {:.0} km/h", observation.wind_speed_kmh),
            )
            .for_day(&observation.label)
            .with_action("Secure crops & support structures"),
        )
    }
}
