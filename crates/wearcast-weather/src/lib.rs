//! Weather data for Wearcast
//!
//! Current conditions, the 3-hourly forecast and geocoding from the
//! OpenWeatherMap API, plus the device location seam.

pub mod error;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use error::{LocationError, WeatherError};
pub use location::{ConfiguredLocation, LocationSource};
pub use provider::{OpenWeatherProvider, WeatherGateway};
pub use types::*;
pub use wearcast_core::UnitSystem;
