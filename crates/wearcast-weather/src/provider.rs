//! OpenWeatherMap gateway: current conditions + 5 day / 3 hour forecast.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;
use url::Url;
use wearcast_core::{is_placeholder_key, UnitSystem};

use crate::error::WeatherError;
use crate::geocode;
use crate::types::{
    Condition, Coordinates, CurrentConditions, ForecastEntry, ForecastSeries, GeoMatch, Lookup,
    PlaceName, WeatherSnapshot, Wind,
};

pub const WEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
pub const GEO_API_BASE: &str = "https://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Read-only weather and geocoding lookups used by the pipeline.
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    /// Fetch current conditions and the forecast together. Fails if either read fails.
    async fn fetch_current_and_forecast(
        &self,
        at: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError>;

    /// Best-effort place name for a position. Never fails.
    async fn reverse_geocode(&self, at: Coordinates) -> Lookup<PlaceName>;

    /// Best-effort search for a city by name.
    ///
    /// Misses come back as `Lookup` values. The only error is a missing API
    /// key, which no retry can fix.
    async fn forward_geocode(&self, query: &str) -> Result<Lookup<GeoMatch>, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Arc<Client>,
    api_key: String,
    units: UnitSystem,
    weather_base: String,
    geo_base: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>, units: UnitSystem) -> Result<Self, WeatherError> {
        Self::with_timeout(api_key, units, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        units: UnitSystem,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.into(),
            units,
            weather_base: WEATHER_API_BASE.to_string(),
            geo_base: GEO_API_BASE.to_string(),
        })
    }

    /// Point the provider at different hosts (self-hosted proxy, test server).
    pub fn with_base_urls(
        mut self,
        weather_base: impl Into<String>,
        geo_base: impl Into<String>,
    ) -> Self {
        self.weather_base = weather_base.into().trim_end_matches('/').to_string();
        self.geo_base = geo_base.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn geo_base(&self) -> &str {
        &self.geo_base
    }

    pub(crate) fn has_api_key(&self) -> bool {
        !is_placeholder_key(&self.api_key)
    }

    pub(crate) fn endpoint(
        base: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Url, WeatherError> {
        Ok(Url::parse_with_params(&format!("{}/{}", base, path), params)?)
    }

    fn coordinate_params(&self, at: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("units", self.units.as_query().to_string()),
            ("appid", self.api_key.clone()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        endpoint: &'static str,
    ) -> Result<T, WeatherError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} returned status {}", endpoint, status);
            return Err(WeatherError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| WeatherError::Parse(format!("{}: {}", endpoint, e)))
    }

    /// Fetch current conditions and forecast concurrently. No retry.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        if !self.has_api_key() {
            return Err(WeatherError::MissingApiKey);
        }

        let params = self.coordinate_params(at);
        let current_url = Self::endpoint(&self.weather_base, "weather", &params)?;
        let forecast_url = Self::endpoint(&self.weather_base, "forecast", &params)?;

        let (current, forecast) = tokio::try_join!(
            self.get_json::<ApiCurrent>(current_url, "current weather"),
            self.get_json::<ApiForecast>(forecast_url, "forecast"),
        )?;

        let snapshot = WeatherSnapshot {
            current: current.try_into()?,
            forecast: forecast.try_into()?,
            fetched_at: Utc::now(),
        };

        tracing::info!(
            "Fetched weather for {}: {:.1}, {} forecast entries",
            snapshot.provider_label(),
            snapshot.current.temperature,
            snapshot.forecast.entries.len()
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherProvider {
    async fn fetch_current_and_forecast(
        &self,
        at: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch(at).await
    }

    async fn reverse_geocode(&self, at: Coordinates) -> Lookup<PlaceName> {
        geocode::reverse_geocode(self, at).await
    }

    async fn forward_geocode(&self, query: &str) -> Result<Lookup<GeoMatch>, WeatherError> {
        geocode::forward_geocode(self, query).await
    }
}

// Provider response shapes. Only the fields Wearcast reads are declared.

#[derive(Debug, Deserialize)]
struct ApiCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    #[serde(default)]
    pressure: f64,
    #[serde(default)]
    humidity: f64,
}

impl ApiMain {
    fn humidity_percent(&self) -> u8 {
        self.humidity.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
    gust: Option<f64>,
}

impl From<ApiWind> for Wind {
    fn from(w: ApiWind) -> Self {
        Wind {
            speed: w.speed,
            direction: w.deg,
            gust: w.gust,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiSys {
    #[serde(default)]
    country: String,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    coord: ApiCoord,
    #[serde(default)]
    weather: Vec<Condition>,
    main: ApiMain,
    #[serde(default)]
    wind: ApiWind,
    dt: i64,
    #[serde(default)]
    sys: ApiSys,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecastItem {
    dt: i64,
    main: ApiMain,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: ApiWind,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct ApiCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    list: Vec<ApiForecastItem>,
    city: Option<ApiCity>,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {}", secs)))
}

impl TryFrom<ApiCurrent> for CurrentConditions {
    type Error = WeatherError;

    fn try_from(api: ApiCurrent) -> Result<Self, Self::Error> {
        let humidity = api.main.humidity_percent();
        Ok(CurrentConditions {
            coordinates: Coordinates::new(api.coord.lat, api.coord.lon),
            temperature: api.main.temp,
            feels_like: api.main.feels_like,
            temp_min: api.main.temp_min.unwrap_or(api.main.temp),
            temp_max: api.main.temp_max.unwrap_or(api.main.temp),
            pressure: api.main.pressure,
            humidity,
            wind: api.wind.into(),
            conditions: api.weather,
            observed_at: timestamp(api.dt)?,
            place: PlaceName::new(api.name, api.sys.country),
            sunrise: api.sys.sunrise.map(timestamp).transpose()?,
            sunset: api.sys.sunset.map(timestamp).transpose()?,
        })
    }
}

impl TryFrom<ApiForecastItem> for ForecastEntry {
    type Error = WeatherError;

    fn try_from(api: ApiForecastItem) -> Result<Self, Self::Error> {
        let humidity = api.main.humidity_percent();
        Ok(ForecastEntry {
            time: timestamp(api.dt)?,
            time_text: api.dt_txt,
            temperature: api.main.temp,
            feels_like: api.main.feels_like,
            temp_min: api.main.temp_min.unwrap_or(api.main.temp),
            temp_max: api.main.temp_max.unwrap_or(api.main.temp),
            humidity,
            conditions: api.weather,
            wind: api.wind.into(),
            precipitation_probability: api.pop.clamp(0.0, 1.0),
        })
    }
}

impl TryFrom<ApiForecast> for ForecastSeries {
    type Error = WeatherError;

    fn try_from(api: ApiForecast) -> Result<Self, Self::Error> {
        let entries = api
            .list
            .into_iter()
            .map(ForecastEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForecastSeries {
            entries,
            city: api.city.map(|c| PlaceName::new(c.name, c.country)),
        })
    }
}
