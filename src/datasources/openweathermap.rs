use crate::config::OpenWeatherMapConfig;
use crate::error::{CropSafeError, Result};
use crate::models::WeatherObservation;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const MS_TO_KMH: f64 = 3.6;

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    wind: OwmWind,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    snow: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64, // m/s with units=metric
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    name: String,
    #[serde(default)]
    timezone: i64, // UTC offset in seconds
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch the 5-day/3-hour forecast and reduce it to one observation per
    /// local calendar day, starting at `today`.
    pub async fn fetch_forecast(
        &self,
        today: NaiveDate,
        days: usize,
    ) -> Result<Vec<WeatherObservation>> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&appid={}&units=metric",
            API_BASE_URL, self.config.latitude, self.config.longitude, self.config.api_key
        );

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                CropSafeError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropSafeError::DataSourceUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let owm_response: OwmForecastResponse = serde_json::from_str(&body)?;

        tracing::debug!(
            city = %owm_response.city.name,
            points = owm_response.list.len(),
            "Fetched OpenWeatherMap forecast"
        );

        Ok(daily_observations(&owm_response, today, days))
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            API_BASE_URL, self.config.latitude, self.config.longitude, self.config.api_key
        );

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                CropSafeError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        Ok(response.status().is_success())
    }
}

#[derive(Default)]
struct DayAccumulator {
    temp_sum: f64,
    humidity_sum: f64,
    precipitation_mm: f64,
    max_wind_ms: f64,
    count: usize,
}

fn daily_observations(
    response: &OwmForecastResponse,
    today: NaiveDate,
    days: usize,
) -> Vec<WeatherObservation> {
    let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for item in &response.list {
        let Some(local) = DateTime::from_timestamp(item.dt + response.city.timezone, 0) else {
            tracing::warn!(dt = item.dt, "Skipping forecast point with invalid timestamp");
            continue;
        };
        let date = local.date_naive();
        if date < today {
            continue;
        }

        let day = by_date.entry(date).or_default();
        day.temp_sum += item.main.temp;
        day.humidity_sum += item.main.humidity;
        day.precipitation_mm += item.rain.as_ref().map(|r| r.three_hour).unwrap_or(0.0)
            + item.snow.as_ref().map(|s| s.three_hour).unwrap_or(0.0);
        day.max_wind_ms = day.max_wind_ms.max(item.wind.speed);
        day.count += 1;
    }

    by_date
        .into_iter()
        .take(days)
        .map(|(date, day)| {
            let n = day.count.max(1) as f64;
            WeatherObservation::new(
                day_label(date, today),
                day.temp_sum / n,
                day.humidity_sum / n,
                day.precipitation_mm,
                day.max_wind_ms * MS_TO_KMH,
            )
            .on(date)
        })
        .collect()
}

pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match date.signed_duration_since(today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %d %b").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-08-01T00:00:00Z
    const AUG_1: i64 = 1_722_470_400;
    const HOUR: i64 = 3600;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_response(timezone: i64) -> OwmForecastResponse {
        let json = format!(
            r#"{{
                "city": {{ "name": "Pune", "country": "IN", "timezone": {tz} }},
                "list": [
                    {{ "dt": {d1a}, "main": {{ "temp": 20.0, "feels_like": 20.0, "humidity": 80 }},
                       "wind": {{ "speed": 5.0 }}, "rain": {{ "3h": 1.0 }} }},
                    {{ "dt": {d1b}, "main": {{ "temp": 26.0, "feels_like": 27.0, "humidity": 90 }},
                       "wind": {{ "speed": 8.0, "gust": 12.0 }}, "rain": {{ "3h": 2.5 }} }},
                    {{ "dt": {d2}, "main": {{ "temp": 30.0, "feels_like": 31.0, "humidity": 40 }},
                       "wind": {{ "speed": 2.0 }} }}
                ]
            }}"#,
            tz = timezone,
            d1a = AUG_1 + 6 * HOUR,
            d1b = AUG_1 + 12 * HOUR,
            d2 = AUG_1 + 30 * HOUR,
        );
        serde_json::from_str(&json).unwrap()
    }

    fn sample_config() -> OpenWeatherMapConfig {
        OpenWeatherMapConfig {
            api_key: "test_key".to_string(),
            latitude: 18.52,
            longitude: 73.86,
            enabled: true,
        }
    }

    #[test]
    fn client_creation() {
        let client = OpenWeatherMapClient::new(sample_config());
        assert!(client.config.enabled);
    }

    #[test]
    fn aggregates_points_into_daily_observations() {
        let observations = daily_observations(&sample_response(0), date(2024, 8, 1), 3);
        assert_eq!(observations.len(), 2);

        let today = &observations[0];
        assert_eq!(today.label, "Today");
        assert_eq!(today.date, Some(date(2024, 8, 1)));
        assert_eq!(today.temperature_c, 23.0);
        assert_eq!(today.humidity_pct, 85.0);
        assert_eq!(today.rainfall_mm, 3.5);
        assert!((today.wind_speed_kmh - 28.8).abs() < 1e-9);

        let tomorrow = &observations[1];
        assert_eq!(tomorrow.label, "Tomorrow");
        assert_eq!(tomorrow.rainfall_mm, 0.0);
        assert!((tomorrow.wind_speed_kmh - 7.2).abs() < 1e-9);
    }

    #[test]
    fn drops_past_days_and_honours_limit() {
        let observations = daily_observations(&sample_response(0), date(2024, 8, 2), 3);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].label, "Today");

        let limited = daily_observations(&sample_response(0), date(2024, 8, 1), 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn groups_by_local_date_using_city_offset() {
        // +14h pushes the 12:00Z point past local midnight
        let observations = daily_observations(&sample_response(14 * HOUR), date(2024, 8, 1), 3);
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].temperature_c, 20.0);
        assert_eq!(observations[1].date, Some(date(2024, 8, 2)));
        assert_eq!(observations[1].temperature_c, 28.0);
    }

    #[test]
    fn labels_later_days_with_date() {
        let today = date(2024, 8, 12);
        assert_eq!(day_label(today, today), "Today");
        assert_eq!(day_label(date(2024, 8, 13), today), "Tomorrow");
        assert_eq!(day_label(date(2024, 8, 14), today), "Wed 14 Aug");
    }
}
