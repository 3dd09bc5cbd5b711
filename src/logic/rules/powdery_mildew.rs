use super::WeatherRule;
use crate::models::{RiskAlert, RiskLevel, WeatherObservation};

const HUMIDITY_THRESHOLD_PCT: f64 = 80.0;
const MIN_TEMP_C: f64 = 20.0;
const MAX_TEMP_C: f64 = 27.0;

/// Powdery mildew risk
///
/// Conidia germinate and spread fastest in warm, humid air:
/// - Humidity above 80%
/// - Temperature between 20°C and 27°C inclusive
pub struct PowderyMildewRule;

impl WeatherRule for PowderyMildewRule {
    fn id(&self) -> &'static str {
        "mildew"
    }

    fn name(&self) -> &'static str {
        "Powdery Mildew"
    }

    fn evaluate(&self, observation: &WeatherObservation, index: usize) -> Option<RiskAlert> {
        let humid = observation.humidity_pct > HUMIDITY_THRESHOLD_PCT;
        let warm = (MIN_TEMP_C..=MAX_TEMP_C).contains(&observation.temperature_c);

        if !humid || !warm {
            return None;
        }

        let alert = RiskAlert::new(
            self.id(),
            index,
            RiskLevel::High,
            "Powdery Mildew Risk",
            format!(
                "High humidity ({:.0}%) with warm temperatures ({:.0}°C)",
                observation.humidity_pct, observation.temperature_c
            ),
        )
        .for_day(&observation.label)
        .with_action("Apply sulfur or neem oil spray");

        Some(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_in_warm_humid_conditions() {
        let obs = WeatherObservation::new("Today", 24.0, 85.0, 0.0, 5.0);
        let alert = PowderyMildewRule.evaluate(&obs, 0).unwrap();
        assert_eq!(alert.id, "mildew-0");
        assert_eq!(alert.risk_level, RiskLevel::High);
        assert_eq!(alert.observation_label, "Today");
        assert_eq!(alert.recommended_action, "Apply sulfur or neem oil spray");
    }

    #[test]
    fn temperature_bounds_are_inclusive() {
        let low = WeatherObservation::new("d", 20.0, 81.0, 0.0, 0.0);
        let high = WeatherObservation::new("d", 27.0, 81.0, 0.0, 0.0);
        assert!(PowderyMildewRule.evaluate(&low, 0).is_some());
        assert!(PowderyMildewRule.evaluate(&high, 0).is_some());

        let too_cold = WeatherObservation::new("d", 19.9, 90.0, 0.0, 0.0);
        let too_hot = WeatherObservation::new("d", 27.1, 90.0, 0.0, 0.0);
        assert!(PowderyMildewRule.evaluate(&too_cold, 0).is_none());
        assert!(PowderyMildewRule.evaluate(&too_hot, 0).is_none());
    }

    #[test]
    fn humidity_threshold_is_exclusive() {
        let obs = WeatherObservation::new("d", 24.0, 80.0, 0.0, 0.0);
        assert!(PowderyMildewRule.evaluate(&obs, 0).is_none());
    }
}
