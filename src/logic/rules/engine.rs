use super::{
    leaf_spot::LeafSpotRule, powdery_mildew::PowderyMildewRule, wind_damage::WindDamageRule,
    WeatherRule,
};
use crate::models::{AlertSummary, RiskAlert, RiskLevel, WeatherObservation};

pub struct RiskEngine {
    rules: Vec<Box<dyn WeatherRule>>,
}

impl RiskEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn WeatherRule>> = vec![
            Box::new(PowderyMildewRule),
            Box::new(LeafSpotRule),
            Box::new(WindDamageRule),
        ];

        Self { rules }
    }

    pub fn with_rules(rules: Vec<Box<dyn WeatherRule>>) -> Self {
        Self { rules }
    }

    /// Alerts in observation order, then rule order. Holds no state between
    /// calls, so the same forecast always yields the same list.
    pub fn evaluate(&self, observations: &[WeatherObservation]) -> Vec<RiskAlert> {
        observations
            .iter()
            .enumerate()
            .flat_map(|(index, observation)| {
                self.rules
                    .iter()
                    .filter_map(move |rule| rule.evaluate(observation, index))
            })
            .collect()
    }

    pub fn evaluate_rule(
        &self,
        rule_id: &str,
        observations: &[WeatherObservation],
    ) -> Vec<RiskAlert> {
        self.rules
            .iter()
            .find(|r| r.id() == rule_id)
            .map(|rule| {
                observations
                    .iter()
                    .enumerate()
                    .filter_map(|(index, observation)| rule.evaluate(observation, index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn summarize(alerts: &[RiskAlert]) -> AlertSummary {
        alerts
            .iter()
            .fold(AlertSummary::default(), |mut summary, alert| {
                match alert.risk_level {
                    RiskLevel::High => summary.high_count += 1,
                    RiskLevel::Medium => summary.medium_count += 1,
                    RiskLevel::Low => summary.low_count += 1,
                }
                summary
            })
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}
