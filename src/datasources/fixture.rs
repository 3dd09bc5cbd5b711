use crate::error::{CropSafeError, Result};
use crate::models::WeatherObservation;
use chrono::{Days, NaiveDate};
use std::path::{Path, PathBuf};

/// Static forecast, either the built-in three-day sample or a YAML file.
#[derive(Debug, Clone)]
pub struct FixtureForecast {
    path: Option<PathBuf>,
}

impl FixtureForecast {
    pub fn builtin() -> Self {
        Self { path: None }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self, today: NaiveDate) -> Result<Vec<WeatherObservation>> {
        match &self.path {
            None => Ok(sample_forecast(today)),
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    CropSafeError::DataSourceUnavailable(format!(
                        "Forecast fixture {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let observations: Vec<WeatherObservation> = serde_yaml::from_str(&content)?;
                tracing::debug!(
                    path = %path.display(),
                    days = observations.len(),
                    "Loaded forecast fixture"
                );
                Ok(observations)
            }
        }
    }
}

/// Today plus a two-day outlook.
pub fn sample_forecast(today: NaiveDate) -> Vec<WeatherObservation> {
    let day = |offset: u64| today.checked_add_days(Days::new(offset));

    let mut forecast = vec![
        WeatherObservation::new("Today", 28.0, 75.0, 2.0, 12.0),
        WeatherObservation::new("Tomorrow", 26.0, 82.0, 5.0, 15.0),
        WeatherObservation::new("Day 3", 25.0, 70.0, 0.0, 8.0),
    ];
    for (offset, observation) in forecast.iter_mut().enumerate() {
        observation.date = day(offset as u64);
    }
    forecast
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 31).unwrap()
    }

    #[test]
    fn builtin_sample_has_three_dated_days() {
        let forecast = FixtureForecast::builtin().load(today()).unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].label, "Today");
        assert_eq!(forecast[0].date, Some(today()));
        assert_eq!(forecast[2].date, NaiveDate::from_ymd_opt(2024, 9, 2));
        assert_eq!(forecast[1].humidity_pct, 82.0);
    }

    #[test]
    fn loads_yaml_file() {
        let dir = std::env::temp_dir().join(format!("cropsafe-fixture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("forecast.yaml");
        std::fs::write(
            &path,
            "- label: Monsoon day\n  temperature_c: 24\n  humidity_pct: 92\n  rainfall_mm: 40\n  wind_speed_kmh: 32\n",
        )
        .unwrap();

        let forecast = FixtureForecast::from_file(&path).load(today()).unwrap();
        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast[0].label, "Monsoon day");
        assert_eq!(forecast[0].rainfall_mm, 40.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_unavailable() {
        let result = FixtureForecast::from_file("/nonexistent/forecast.yaml").load(today());
        assert!(matches!(
            result,
            Err(CropSafeError::DataSourceUnavailable(_))
        ));
    }
}
