use crate::error::{CropSafeError, Result};
use crate::logic::ProductRegistry;
use dialoguer::{Input, Select};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_DIR: &str = "cropsafe";
const ENV_PREFIX: &str = "CROPSAFE";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub farm: FarmConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub openweathermap: Option<OpenWeatherMapConfig>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    pub name: String,
    #[serde(default)]
    pub crop: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSourceKind {
    #[default]
    Fixture,
    OpenWeatherMap,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub source: ForecastSourceKind,
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,
}

fn default_forecast_days() -> usize {
    3
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            source: ForecastSourceKind::Fixture,
            fixture_path: None,
            forecast_days: default_forecast_days(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Extra or overriding entry for the known-product registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductConfig {
    pub name: String,
    pub withdrawal_days: u32,
}

impl Config {
    /// Load from the override path, then the standard locations. Falls back
    /// to defaults when no file exists anywhere.
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(CropSafeError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p.clone()
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::info!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!(path = %config_path.display(), "Loading configuration");

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CropSafeError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml_str(&config_str)
    }

    /// Parse YAML after `${VAR}` substitution, layering
    /// `CROPSAFE_<SECTION>__<KEY>` environment overrides on top.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;

        let config = ::config::Config::builder()
            .add_source(::config::File::from_str(
                &content,
                ::config::FileFormat::Yaml,
            ))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CropSafeError::Config(format!("Failed to parse config: {}", e)))?;

        let config: Config = config
            .try_deserialize()
            .map_err(|e| CropSafeError::Config(format!("Invalid config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.weather.forecast_days == 0 {
            return Err(CropSafeError::Config(
                "weather.forecast_days must be at least 1".into(),
            ));
        }
        if self.weather.source == ForecastSourceKind::OpenWeatherMap
            && self.openweathermap.is_none()
        {
            return Err(CropSafeError::Config(
                "weather.source is openweathermap but the openweathermap section is missing"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    pub fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/cropsafe/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CropSafeError::Config("Cannot determine config directory".into()))?
            .join(APP_DIR);
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up CropSafe!");
        println!();

        println!("Farm");
        let farm_name: String = Input::new()
            .with_prompt("  Farm name")
            .default("My Farm".into())
            .interact_text()
            .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

        let crop: String = Input::new()
            .with_prompt("  Main crop (blank to skip)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

        println!();

        println!("Weather");
        let sources = ["Built-in sample forecast", "OpenWeatherMap"];
        let source_idx = Select::new()
            .with_prompt("  Forecast source")
            .items(&sources)
            .default(0)
            .interact()
            .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

        let openweathermap = if source_idx == 1 {
            let api_key: String = Input::new()
                .with_prompt("  API key")
                .interact_text()
                .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

            let latitude: f64 = Input::new()
                .with_prompt("  Latitude")
                .default(18.52)
                .interact_text()
                .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

            let longitude: f64 = Input::new()
                .with_prompt("  Longitude")
                .default(73.86)
                .interact_text()
                .map_err(|e| CropSafeError::Config(format!("Input error: {}", e)))?;

            Some(OpenWeatherMapConfig {
                api_key,
                latitude,
                longitude,
                enabled: true,
            })
        } else {
            None
        };

        println!();

        let config = Config {
            farm: FarmConfig {
                name: farm_name,
                crop: (!crop.is_empty()).then_some(crop),
            },
            weather: WeatherConfig {
                source: if openweathermap.is_some() {
                    ForecastSourceKind::OpenWeatherMap
                } else {
                    ForecastSourceKind::Fixture
                },
                ..WeatherConfig::default()
            },
            openweathermap,
            products: Vec::new(),
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| CropSafeError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# CropSafe Configuration\n# Generated by `cropsafe init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| CropSafeError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }

    /// Known products with config entries layered over the built-in table.
    pub fn product_registry(&self) -> ProductRegistry {
        let mut registry = ProductRegistry::new();
        for product in &self.products {
            registry.insert(&product.name, product.withdrawal_days);
        }
        registry
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("CROPSAFE_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropSafeError::Config("Cannot determine data directory".into()))?
            .join(APP_DIR);

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropsafe.db"))
    }

    pub fn log_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropsafe.log"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            farm: FarmConfig {
                name: "My Farm".into(),
                crop: None,
            },
            weather: WeatherConfig::default(),
            openweathermap: None,
            products: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = Config::from_yaml_str("farm:\n  name: Green Acres\n").unwrap();
        assert_eq!(config.farm.name, "Green Acres");
        assert_eq!(config.farm.crop, None);
        assert_eq!(config.weather.source, ForecastSourceKind::Fixture);
        assert_eq!(config.weather.forecast_days, 3);
        assert!(config.openweathermap.is_none());
        assert!(config.products.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
farm:
  name: Riverside
  crop: Tomato
weather:
  source: openweathermap
  forecast_days: 5
openweathermap:
  api_key: abc123
  latitude: 18.52
  longitude: 73.86
products:
  - name: Chlorpyrifos
    withdrawal_days: 15
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.weather.source, ForecastSourceKind::OpenWeatherMap);
        assert_eq!(config.weather.forecast_days, 5);
        let owm = config.openweathermap.as_ref().unwrap();
        assert!(owm.enabled);
        assert_eq!(owm.latitude, 18.52);

        let registry = config.product_registry();
        assert_eq!(registry.lookup_default_withdrawal_days("chlorpyrifos"), Some(15));
        assert_eq!(registry.lookup_default_withdrawal_days("Mancozeb"), Some(5));
    }

    #[test]
    fn openweathermap_source_requires_section() {
        let yaml = "farm:\n  name: Riverside\nweather:\n  source: openweathermap\n";
        assert!(matches!(
            Config::from_yaml_str(yaml),
            Err(CropSafeError::Config(_))
        ));
    }

    #[test]
    fn zero_forecast_days_rejected() {
        let yaml = "farm:\n  name: Riverside\nweather:\n  forecast_days: 0\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn substitutes_environment_variables() {
        std::env::set_var("CROPSAFE_TEST_OWM_KEY", "secret-key");
        let out = Config::substitute_env_vars("api_key: ${CROPSAFE_TEST_OWM_KEY}").unwrap();
        assert_eq!(out, "api_key: secret-key");

        let untouched = Config::substitute_env_vars("api_key: ${CROPSAFE_TEST_UNSET_VAR}").unwrap();
        assert_eq!(untouched, "api_key: ${CROPSAFE_TEST_UNSET_VAR}");
    }

    #[test]
    fn debug_redacts_api_key() {
        let owm = OpenWeatherMapConfig {
            api_key: "super-secret".into(),
            latitude: 0.0,
            longitude: 0.0,
            enabled: true,
        };
        let debug = format!("{:?}", owm);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn missing_override_path_is_an_error() {
        let path = PathBuf::from("/nonexistent/cropsafe/config.yaml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
