use crate::error::{CropSafeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather as consumed by the risk engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub label: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    pub wind_speed_kmh: f64,
}

impl WeatherObservation {
    pub fn new(
        label: impl Into<String>,
        temperature_c: f64,
        humidity_pct: f64,
        rainfall_mm: f64,
        wind_speed_kmh: f64,
    ) -> Self {
        Self {
            label: label.into(),
            date: None,
            temperature_c,
            humidity_pct,
            rainfall_mm,
            wind_speed_kmh,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Boundary check applied by forecast sources. The rule engine assumes
    /// observations have already passed it.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("temperature", self.temperature_c),
            ("humidity", self.humidity_pct),
            ("rainfall", self.rainfall_mm),
            ("wind speed", self.wind_speed_kmh),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CropSafeError::InvalidData(format!(
                    "{}: {} is not a finite number",
                    self.label, name
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.humidity_pct) {
            return Err(CropSafeError::InvalidData(format!(
                "{}: humidity {}% outside 0-100",
                self.label, self.humidity_pct
            )));
        }
        if self.rainfall_mm < 0.0 {
            return Err(CropSafeError::InvalidData(format!(
                "{}: negative rainfall {}mm",
                self.label, self.rainfall_mm
            )));
        }
        if self.wind_speed_kmh < 0.0 {
            return Err(CropSafeError::InvalidData(format!(
                "{}: negative wind speed {}km/h",
                self.label, self.wind_speed_kmh
            )));
        }
        Ok(())
    }
}

/// Validate a whole forecast, failing on the first bad entry.
pub fn validate_all(observations: &[WeatherObservation]) -> Result<()> {
    observations.iter().try_for_each(WeatherObservation::validate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_observation_passes() {
        let obs = WeatherObservation::new("Today", 28.0, 75.0, 2.0, 12.0);
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn humidity_out_of_range_rejected() {
        let obs = WeatherObservation::new("Today", 28.0, 104.0, 0.0, 0.0);
        assert!(matches!(obs.validate(), Err(CropSafeError::InvalidData(_))));

        let obs = WeatherObservation::new("Today", 28.0, -1.0, 0.0, 0.0);
        assert!(obs.validate().is_err());
    }

    #[test]
    fn negative_rain_or_wind_rejected() {
        assert!(WeatherObservation::new("Day 3", 20.0, 50.0, -0.5, 0.0)
            .validate()
            .is_err());
        assert!(WeatherObservation::new("Day 3", 20.0, 50.0, 0.0, -3.0)
            .validate()
            .is_err());
    }

    #[test]
    fn non_finite_values_rejected() {
        let obs = WeatherObservation::new("Tomorrow", f64::NAN, 50.0, 0.0, 0.0);
        assert!(obs.validate().is_err());
    }

    #[test]
    fn validate_all_reports_first_failure() {
        let forecast = vec![
            WeatherObservation::new("Today", 28.0, 75.0, 2.0, 12.0),
            WeatherObservation::new("Tomorrow", 26.0, 182.0, 5.0, 15.0),
        ];
        let err = validate_all(&forecast).unwrap_err();
        assert!(err.to_string().contains("Tomorrow"));
    }

    #[test]
    fn deserializes_without_date() {
        let yaml = "label: Today\ntemperature_c: 24\nhumidity_pct: 85\nrainfall_mm: 0\nwind_speed_kmh: 5\n";
        let obs: WeatherObservation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(obs.date, None);
        assert_eq!(obs.humidity_pct, 85.0);
    }
}
