mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use wearcast_advice::GeminiAdvisor;
use wearcast_core::Config;
use wearcast_pipeline::WeatherController;
use wearcast_weather::{ConfiguredLocation, Coordinates, OpenWeatherProvider};

/// Weather forecast with outfit advice
#[derive(Debug, Parser)]
#[command(name = "wearcast", version, about)]
struct Args {
    /// Search for a city instead of using the device position
    #[arg(long)]
    city: Option<String>,

    /// Device latitude (stands in for a location service)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Device longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Refresh once after the first result
    #[arg(long)]
    refresh: bool,

    /// Config file to use instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    wearcast_core::init()?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    config.apply_env_overrides();
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        config.location.device_latitude = Some(lat);
        config.location.device_longitude = Some(lon);
    }

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !validation.is_valid() {
        bail!("Invalid configuration: {}", validation.error_summary());
    }

    let units = config.weather.units;
    let weather = OpenWeatherProvider::with_timeout(
        &config.weather.api_key,
        units,
        Duration::from_secs(config.weather.timeout_secs),
    )?
    .with_base_urls(&config.weather.base_url, &config.weather.geo_url);

    let advisor = GeminiAdvisor::with_timeout(
        &config.advice.api_key,
        &config.advice.model,
        Duration::from_secs(config.advice.timeout_secs),
    )?
    .with_base_url(&config.advice.base_url);
    tracing::info!("Outfit advice via {}", advisor.model());

    let locator = ConfiguredLocation::new(
        config
            .location
            .device_position()
            .map(|(lat, lon)| Coordinates::new(lat, lon)),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let controller =
        WeatherController::new(Arc::new(weather), Arc::new(advisor), Arc::new(locator))
            .with_fallback(Coordinates::new(
                config.location.fallback_latitude,
                config.location.fallback_longitude,
            ))
            .with_observer(tx);

    let renderer = tokio::spawn(async move {
        while let Some(state) = rx.recv().await {
            if let Some(text) = render::render_transition(&state, units) {
                println!("{}\n", text);
            }
        }
    });

    tracing::info!("Wearcast started");

    match args.city.as_deref() {
        Some(city) => controller.run_search_cycle(city).await,
        None => controller.request_location().await,
    }
    if args.refresh {
        controller.refresh().await;
    }

    // Closing the observer channel ends the renderer
    drop(controller);
    renderer.await.context("Renderer task failed")?;

    Ok(())
}
