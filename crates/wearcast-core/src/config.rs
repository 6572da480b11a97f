use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Placeholder written into a fresh config file for the weather key.
pub const WEATHER_KEY_PLACEHOLDER: &str = "YOUR_OPENWEATHER_API_KEY_HERE";

/// Placeholder written into a fresh config file for the Gemini key.
pub const ADVICE_KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Unit system requested from the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    /// Kelvin and m/s, the provider's raw units.
    Standard,
}

impl UnitSystem {
    /// Value for the provider's `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key (overridden by `OPENWEATHER_API_KEY`)
    #[serde(default = "default_weather_key")]
    pub api_key: String,

    #[serde(default)]
    pub units: UnitSystem,

    /// Base URL for current weather and forecast reads
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Base URL for forward and reverse geocoding
    #[serde(default = "default_geo_base_url")]
    pub geo_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_key() -> String {
    WEATHER_KEY_PLACEHOLDER.to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: default_weather_key(),
            units: UnitSystem::default(),
            base_url: default_weather_base_url(),
            geo_url: default_geo_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceConfig {
    /// Gemini API key (overridden by `GEMINI_API_KEY`, then `API_KEY`)
    #[serde(default = "default_advice_key")]
    pub api_key: String,

    /// Generative model name (overridden by `WEARCAST_MODEL`)
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_advice_base_url")]
    pub base_url: String,

    /// Generation is slower than a weather read
    #[serde(default = "default_advice_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_advice_timeout_secs() -> u64 {
    30
}

fn default_advice_key() -> String {
    ADVICE_KEY_PLACEHOLDER.to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_advice_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            api_key: default_advice_key(),
            model: default_model(),
            base_url: default_advice_base_url(),
            timeout_secs: default_advice_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Coordinates used when the device position is denied or unavailable
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,

    /// Fixed device position. Leave both unset to report geolocation as unsupported.
    #[serde(default)]
    pub device_latitude: Option<f64>,
    #[serde(default)]
    pub device_longitude: Option<f64>,
}

fn default_fallback_latitude() -> f64 {
    40.7128
}

fn default_fallback_longitude() -> f64 {
    -74.0060
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
            device_latitude: None,
            device_longitude: None,
        }
    }
}

impl LocationConfig {
    /// Configured device position as `(latitude, longitude)`, if both halves are set.
    pub fn device_position(&self) -> Option<(f64, f64)> {
        self.device_latitude.zip(self.device_longitude)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub advice: AdviceConfig,

    #[serde(default)]
    pub location: LocationConfig,
}

/// True for empty keys and the `YOUR_...` placeholders shipped in fresh configs.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.starts_with("YOUR_")
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `OPENWEATHER_API_KEY`, `GEMINI_API_KEY`/`API_KEY` and `WEARCAST_MODEL`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENWEATHER_API_KEY") {
            self.weather.api_key = key;
        }
        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.advice.api_key = key;
        }
        if let Some(model) = non_empty("WEARCAST_MODEL") {
            self.advice.model = model;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.weather.geo_url, "weather.geo_url", &mut result);
        validate_url(&self.advice.base_url, "advice.base_url", &mut result);

        if is_placeholder_key(&self.weather.api_key) {
            result.add_warning(
                "weather.api_key",
                "OpenWeatherMap API key not configured - weather requests will fail",
            );
        }
        if is_placeholder_key(&self.advice.api_key) {
            result.add_warning(
                "advice.api_key",
                "Gemini API key not configured - outfit advice will use the fallback",
            );
        }

        if self.advice.model.trim().is_empty() {
            result.add_error("advice.model", "Model name must not be empty");
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }
        if self.advice.timeout_secs == 0 {
            result.add_error("advice.timeout_secs", "Timeout must be greater than 0");
        }

        validate_coordinates(
            self.location.fallback_latitude,
            self.location.fallback_longitude,
            "location.fallback",
            &mut result,
        );

        match (self.location.device_latitude, self.location.device_longitude) {
            (Some(lat), Some(lon)) => {
                validate_coordinates(lat, lon, "location.device", &mut result)
            }
            (None, None) => {}
            _ => result.add_error(
                "location.device",
                "device_latitude and device_longitude must be set together",
            ),
        }

        result
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("wearcast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }
            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => result.add_error(field_name, format!("Invalid URL: {}", e)),
    }
}

fn validate_coordinates(lat: f64, lon: f64, field_name: &str, result: &mut ValidationResult) {
    if !(-90.0..=90.0).contains(&lat) {
        result.add_error(field_name, format!("Latitude out of range: {}", lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        result.add_error(field_name, format!("Longitude out of range: {}", lon));
    }
}
