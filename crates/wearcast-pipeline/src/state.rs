//! The pipeline's state record and the user-facing strings it carries.

use std::sync::Arc;

use wearcast_advice::Advisory;
use wearcast_weather::{ForecastPoint, WeatherSnapshot};

/// Label before anything has been requested
pub const INITIAL_LABEL: &str = "Locating...";
/// Label while a position without a known name is being resolved
pub const RESOLVING_LABEL: &str = "Checking location...";
/// Label after a failed search when older weather is still on screen
pub const UNKNOWN_LOCATION_LABEL: &str = "Unknown Location";

pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";
pub const LOCATION_DENIED_NOTICE: &str = "Location access denied. Showing New York.";
pub const LOCATION_UNSUPPORTED_NOTICE: &str = "Geolocation not supported. Showing default.";
pub const LOCATION_UNAVAILABLE_NOTICE: &str = "Location unavailable. Showing default.";

pub fn searching_label(query: &str) -> String {
    format!("Searching \"{}\"...", query)
}

pub fn city_not_found_message(query: &str) -> String {
    format!("Could not find city: \"{}\"", query)
}

/// Where the current cycle is.
///
/// `Idle -> ResolvingLocation -> WeatherReady -> InferringAdvice -> AdviceReady`,
/// with `Failed` reachable from `ResolvingLocation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ResolvingLocation,
    WeatherReady,
    InferringAdvice,
    AdviceReady,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Non-fatal notice, e.g. geolocation fallback
    Info,
    Error,
}

/// Dismissible message shown above the weather
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

/// Everything the presentation layer needs, cloned out of the controller.
///
/// `loading` (weather in flight) and `analyzing` (advice in flight) are
/// independent so weather can be shown while advice is still pending.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    pub label: String,
    pub snapshot: Option<Arc<WeatherSnapshot>>,
    /// Always computed from `snapshot`; cleared when a new cycle starts
    pub advisory: Option<Arc<Advisory>>,
    pub loading: bool,
    pub analyzing: bool,
    pub error: Option<Banner>,
    /// Incremented by every cycle and search
    pub generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            label: INITIAL_LABEL.to_string(),
            snapshot: None,
            advisory: None,
            loading: false,
            analyzing: false,
            error: None,
            generation: 0,
        }
    }
}

impl ViewState {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|b| b.message.as_str())
    }

    /// Either request is in flight; refresh is ignored meanwhile
    pub fn is_busy(&self) -> bool {
        self.loading || self.analyzing
    }

    /// Weather is on screen and advice is still being computed
    pub fn advice_pending(&self) -> bool {
        self.snapshot.is_some() && self.advisory.is_none() && self.analyzing
    }

    /// Chart points for the next ~24 hours
    pub fn short_term_points(&self) -> Vec<ForecastPoint> {
        self.snapshot
            .as_ref()
            .map(|s| s.forecast.short_term_points())
            .unwrap_or_default()
    }
}
