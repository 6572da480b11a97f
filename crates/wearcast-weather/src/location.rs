//! Device location seam.
//!
//! The pipeline asks a `LocationSource` once per forced location request.
//! Denial and "no capability" are separate errors but callers handle both
//! by falling back to default coordinates.

use async_trait::async_trait;

use crate::error::LocationError;
use crate::types::Coordinates;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Current device position, settled once.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Position fixed by configuration or command line.
///
/// With no position configured it behaves like a device without geolocation.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    position: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn unsupported() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl LocationSource for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        match self.position {
            Some(at) => {
                tracing::info!("Got location: {}, {}", at.latitude, at.longitude);
                Ok(at)
            }
            None => Err(LocationError::Unsupported),
        }
    }
}
