pub mod config;
pub mod error;

pub use config::{
    is_placeholder_key, AdviceConfig, Config, ConfigValidationError, LocationConfig, UnitSystem,
    ValidationResult, WeatherConfig, ADVICE_KEY_PLACEHOLDER, WEATHER_KEY_PLACEHOLDER,
};
pub use error::{ConfigError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Initialize logging for the process.
///
/// `RUST_LOG` overrides the default `info` filter. Calling this more than
/// once is harmless; later calls keep the first subscriber.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Wearcast core initialized");
    }
    Ok(())
}
