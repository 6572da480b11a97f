//! Orchestration for Wearcast.
//!
//! One `WeatherController` sequences location resolution, the weather
//! fetch and advice inference, and owns the single `ViewState` record the
//! presentation layer renders from.

pub mod controller;
pub mod state;

pub use controller::{resolve_label, WeatherController};
pub use state::{
    city_not_found_message, searching_label, Banner, BannerKind, Phase, ViewState, INITIAL_LABEL,
    LOCATION_DENIED_NOTICE, LOCATION_UNAVAILABLE_NOTICE, LOCATION_UNSUPPORTED_NOTICE,
    RESOLVING_LABEL, SEARCH_FAILED_MESSAGE, UNKNOWN_LOCATION_LABEL,
};
