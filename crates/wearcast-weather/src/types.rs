use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of forecast entries that make up the short-term view (~24h at 3h steps).
pub const SHORT_TERM_ENTRIES: usize = 8;

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Shown when the device position is denied or unavailable (New York).
pub const DEFAULT_COORDINATES: Coordinates = Coordinates::new(40.7128, -74.0060);

/// A place as named by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    pub name: String,
    pub country: String,
}

impl PlaceName {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }

    /// Display label, e.g. "Springfield, US"
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// Result of a forward geocode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub coordinates: Coordinates,
    pub place: PlaceName,
}

/// Outcome of a best-effort lookup.
///
/// `NoMatch` and `Unavailable` are both non-fatal, but callers that care
/// (city search) can tell an empty result from a failed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NoMatch,
    Unavailable(String),
}

impl<T> Lookup<T> {
    /// Collapse to an `Option`, treating both misses as absent.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NoMatch | Lookup::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NoMatch => Lookup::NoMatch,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }
}

/// One provider condition code ("Rain", "light rain", icon "10d")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    /// Meteorological direction in degrees
    pub direction: f64,
    pub gust: Option<f64>,
}

/// Point-in-time reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// hPa
    pub pressure: f64,
    /// Relative humidity, percent
    pub humidity: u8,
    pub wind: Wind,
    pub conditions: Vec<Condition>,
    pub observed_at: DateTime<Utc>,
    /// The provider's own name for the station's place
    pub place: PlaceName,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl CurrentConditions {
    /// Description of the primary condition, empty if the provider sent none
    pub fn description(&self) -> &str {
        self.conditions
            .first()
            .map(|c| c.description.as_str())
            .unwrap_or("")
    }
}

/// One 3-hour forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    /// Provider's own timestamp text ("2024-05-01 12:00:00")
    pub time_text: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub conditions: Vec<Condition>,
    pub wind: Wind,
    /// Probability of precipitation, 0.0 to 1.0
    pub precipitation_probability: f64,
}

impl ForecastEntry {
    pub fn description(&self) -> &str {
        self.conditions
            .first()
            .map(|c| c.description.as_str())
            .unwrap_or("")
    }

    /// `time_text`, or the timestamp formatted the same way when the provider omitted it
    pub fn label_time(&self) -> String {
        if self.time_text.is_empty() {
            self.time.format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            self.time_text.clone()
        }
    }
}

/// Chart-ready view of one short-term entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature: i64,
    pub precipitation_percent: f64,
}

/// Chronological forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub entries: Vec<ForecastEntry>,
    /// City the forecast endpoint reported, if any
    pub city: Option<PlaceName>,
}

impl ForecastSeries {
    /// The first `SHORT_TERM_ENTRIES` entries, in provider order
    pub fn short_term(&self) -> &[ForecastEntry] {
        let end = self.entries.len().min(SHORT_TERM_ENTRIES);
        &self.entries[..end]
    }

    pub fn short_term_points(&self) -> Vec<ForecastPoint> {
        self.short_term()
            .iter()
            .map(|entry| ForecastPoint {
                time: entry.time,
                temperature: entry.temperature.round() as i64,
                precipitation_percent: entry.precipitation_probability * 100.0,
            })
            .collect()
    }
}

/// Current conditions and forecast from the same fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Label built from the provider's embedded place name.
    ///
    /// Remote coordinates often come back with an empty current-weather name;
    /// the forecast's city is used then.
    pub fn provider_label(&self) -> String {
        match &self.forecast.city {
            Some(city) if self.current.place.name.is_empty() => city.label(),
            _ => self.current.place.label(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.current.coordinates
    }
}
