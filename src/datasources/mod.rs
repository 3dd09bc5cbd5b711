pub mod fixture;
pub mod openweathermap;

pub use fixture::FixtureForecast;
pub use openweathermap::OpenWeatherMapClient;

use crate::config::{Config, ForecastSourceKind};
use crate::error::Result;
use crate::logic::Clock;
use crate::models::{validate_all, WeatherObservation};
use std::sync::Arc;

enum Source {
    Fixture(FixtureForecast),
    OpenWeatherMap(OpenWeatherMapClient),
}

/// Weather data collaborator. Every observation it hands out has passed
/// boundary validation.
pub struct ForecastProvider {
    source: Source,
    clock: Arc<dyn Clock>,
    days: usize,
}

impl ForecastProvider {
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let days = config.weather.forecast_days;

        let owm = config
            .openweathermap
            .as_ref()
            .filter(|c| c.enabled && !c.api_key.is_empty());

        let source = match (config.weather.source, owm) {
            (ForecastSourceKind::OpenWeatherMap, Some(owm)) => {
                tracing::info!("OpenWeatherMap client configured for forecast data");
                Source::OpenWeatherMap(OpenWeatherMapClient::new(owm.clone()))
            }
            (ForecastSourceKind::OpenWeatherMap, None) => {
                tracing::warn!(
                    "OpenWeatherMap selected but disabled or missing an API key - using sample forecast"
                );
                Source::Fixture(FixtureForecast::builtin())
            }
            (ForecastSourceKind::Fixture, _) => match &config.weather.fixture_path {
                Some(path) => Source::Fixture(FixtureForecast::from_file(path)),
                None => Source::Fixture(FixtureForecast::builtin()),
            },
        };

        Self {
            source,
            clock,
            days,
        }
    }

    pub fn fixture(fixture: FixtureForecast, clock: Arc<dyn Clock>) -> Self {
        Self {
            source: Source::Fixture(fixture),
            clock,
            days: usize::MAX,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.source {
            Source::Fixture(ref f) if f.path().is_some() => "Fixture file",
            Source::Fixture(_) => "Sample forecast",
            Source::OpenWeatherMap(_) => "OpenWeatherMap",
        }
    }

    pub async fn fetch_forecast(&self) -> Result<Vec<WeatherObservation>> {
        let today = self.clock.today();

        let mut observations = match &self.source {
            Source::Fixture(fixture) => fixture.load(today)?,
            Source::OpenWeatherMap(client) => client.fetch_forecast(today, self.days).await?,
        };
        observations.truncate(self.days);

        validate_all(&observations)?;
        Ok(observations)
    }

    pub async fn test_connection(&self) -> Result<bool> {
        match &self.source {
            Source::Fixture(fixture) => Ok(fixture.load(self.clock.today()).is_ok()),
            Source::OpenWeatherMap(client) => client.test_connection().await,
        }
    }
}
