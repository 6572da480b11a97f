//! Forward and reverse geocoding against the OpenWeatherMap geo API.
//! Both lookups are best-effort: request failures come back as `Lookup` values.
//! City search additionally reports a missing API key as an error.

use serde::Deserialize;
use wearcast_core::ReqwestErrorExt;

use crate::error::WeatherError;
use crate::provider::OpenWeatherProvider;
use crate::types::{Coordinates, GeoMatch, Lookup, PlaceName};

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

/// Human-readable place for a position (e.g. "Seattle, US" via `PlaceName::label`).
pub async fn reverse_geocode(provider: &OpenWeatherProvider, at: Coordinates) -> Lookup<PlaceName> {
    let params = [
        ("lat", at.latitude.to_string()),
        ("lon", at.longitude.to_string()),
        ("limit", "1".to_string()),
        ("appid", provider.api_key().to_string()),
    ];

    let place = first_match(provider, "reverse", &params)
        .await
        .map(|entry| PlaceName::new(entry.name, entry.country));

    if let Lookup::Found(place) = &place {
        tracing::info!("Reverse geocoded to: {}", place.label());
    }
    place
}

/// Best match for a free-text city query.
pub async fn forward_geocode(
    provider: &OpenWeatherProvider,
    query: &str,
) -> Result<Lookup<GeoMatch>, WeatherError> {
    if !provider.has_api_key() {
        return Err(WeatherError::MissingApiKey);
    }

    let params = [
        ("q", query.to_string()),
        ("limit", "1".to_string()),
        ("appid", provider.api_key().to_string()),
    ];

    let found = first_match(provider, "direct", &params).await.map(|entry| GeoMatch {
        coordinates: Coordinates::new(entry.lat, entry.lon),
        place: PlaceName::new(entry.name, entry.country),
    });

    if let Lookup::Found(m) = &found {
        tracing::info!(
            "Geocoded {:?} to {} ({:.4}, {:.4})",
            query,
            m.place.label(),
            m.coordinates.latitude,
            m.coordinates.longitude
        );
    }
    Ok(found)
}

async fn first_match(
    provider: &OpenWeatherProvider,
    path: &str,
    params: &[(&str, String)],
) -> Lookup<GeoEntry> {
    if !provider.has_api_key() {
        tracing::debug!("Skipping {} geocode: no API key", path);
        return Lookup::Unavailable("missing API key".to_string());
    }

    let url = match OpenWeatherProvider::endpoint(provider.geo_base(), path, params) {
        Ok(u) => u,
        Err(e) => return Lookup::Unavailable(e.to_string()),
    };

    let response = match provider.client().get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            let e = e.into_network_error();
            tracing::debug!("{} geocode request failed: {}", path, e);
            return Lookup::Unavailable(e.to_string());
        }
    };

    if !response.status().is_success() {
        tracing::debug!("{} geocode returned status {}", path, response.status());
        return Lookup::Unavailable(format!("HTTP {}", response.status().as_u16()));
    }

    let entries: Vec<GeoEntry> = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("{} geocode parse error: {}", path, e);
            return Lookup::Unavailable(e.to_string());
        }
    };

    match entries.into_iter().next() {
        Some(entry) => Lookup::Found(entry),
        None => Lookup::NoMatch,
    }
}
