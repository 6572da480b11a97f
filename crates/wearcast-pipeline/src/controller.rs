//! Location -> weather -> advice orchestration.
//!
//! All state lives in one `ViewState` behind a mutex and is changed only
//! through `transition` / `transition_if_current`. Each transition is
//! published to the optional observer so the presentation layer can
//! re-render.
//!
//! Every cycle and search bumps `ViewState::generation`. Results that come
//! back for an older generation are dropped, so a slow superseded cycle can
//! never overwrite a newer one.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use wearcast_advice::AdviceGateway;
use wearcast_weather::{
    Coordinates, LocationError, LocationSource, Lookup, PlaceName, WeatherGateway,
    WeatherSnapshot, DEFAULT_COORDINATES,
};

use crate::state::{
    city_not_found_message, searching_label, Banner, Phase, ViewState,
    LOCATION_DENIED_NOTICE, LOCATION_UNAVAILABLE_NOTICE, LOCATION_UNSUPPORTED_NOTICE,
    RESOLVING_LABEL, SEARCH_FAILED_MESSAGE, UNKNOWN_LOCATION_LABEL,
};

pub struct WeatherController {
    weather: Arc<dyn WeatherGateway>,
    advisor: Arc<dyn AdviceGateway>,
    locator: Arc<dyn LocationSource>,
    fallback: Coordinates,
    state: Mutex<ViewState>,
    observer: Option<UnboundedSender<ViewState>>,
}

impl WeatherController {
    pub fn new(
        weather: Arc<dyn WeatherGateway>,
        advisor: Arc<dyn AdviceGateway>,
        locator: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            weather,
            advisor,
            locator,
            fallback: DEFAULT_COORDINATES,
            state: Mutex::new(ViewState::default()),
            observer: None,
        }
    }

    /// Coordinates used when the device position cannot be obtained
    pub fn with_fallback(mut self, fallback: Coordinates) -> Self {
        self.fallback = fallback;
        self
    }

    /// Receive a copy of the state after every transition
    pub fn with_observer(mut self, observer: UnboundedSender<ViewState>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Read-only copy of the current state
    pub fn state(&self) -> ViewState {
        self.state.lock().clone()
    }

    /// Fetch weather for `at`, then advice for that weather.
    ///
    /// With `known_label` the reverse geocode is skipped entirely. Without it,
    /// the reverse geocode runs alongside the weather fetch and the label falls
    /// back to the provider's own place name if it misses.
    pub async fn run_location_cycle(&self, at: Coordinates, known_label: Option<String>) {
        let generation = self.begin_cycle(known_label.as_deref());
        self.complete_cycle(generation, at, known_label).await;
    }

    /// Geocode `query` and run a location cycle for the match.
    ///
    /// Blank queries are ignored without touching state.
    pub async fn run_search_cycle(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring blank search");
            return;
        }

        let generation = self.transition(|s| {
            s.generation += 1;
            s.phase = Phase::ResolvingLocation;
            s.loading = true;
            s.analyzing = false;
            s.label = searching_label(query);
            s.generation
        });

        match self.weather.forward_geocode(query).await {
            Ok(Lookup::Found(found)) => {
                let current = self.state.lock().generation;
                if current != generation {
                    tracing::debug!("Search for {:?} superseded, dropping match", query);
                    return;
                }
                self.run_location_cycle(found.coordinates, Some(found.place.label()))
                    .await;
            }
            Ok(Lookup::NoMatch) => {
                tracing::info!("No city matches {:?}", query);
                self.fail_search(generation, city_not_found_message(query));
            }
            Ok(Lookup::Unavailable(reason)) => {
                tracing::warn!("Search for {:?} failed: {}", query, reason);
                self.fail_search(generation, SEARCH_FAILED_MESSAGE.to_string());
            }
            Err(e) => {
                tracing::error!("Search for {:?} cannot run: {}", query, e);
                self.fail_search(generation, e.user_message());
            }
        }
    }

    /// Re-run the last location with its label, or start from the device
    /// position when nothing has loaded yet.
    ///
    /// Ignored while weather or advice is still in flight.
    pub async fn refresh(&self) {
        let last = {
            let state = self.state.lock();
            if state.is_busy() {
                tracing::debug!("Refresh ignored: cycle {} still busy", state.generation);
                return;
            }
            state
                .snapshot
                .as_ref()
                .map(|snapshot| (snapshot.coordinates(), state.label.clone()))
        };

        match last {
            Some((at, label)) => self.run_location_cycle(at, Some(label)).await,
            None => self.request_location().await,
        }
    }

    /// Ask for the device position and run a cycle there, falling back to
    /// the default coordinates with an informational notice.
    pub async fn request_location(&self) {
        self.transition(|s| s.loading = true);

        match self.locator.current_position().await {
            Ok(at) => self.run_location_cycle(at, None).await,
            Err(e) => {
                tracing::warn!("Geolocation unavailable ({}), using default location", e);
                let notice = self.geolocation_notice(&e);

                let generation = self.begin_cycle(None);
                self.transition_if_current(generation, |s| {
                    s.error = Some(Banner::info(notice));
                });
                self.complete_cycle(generation, self.fallback, None).await;
            }
        }
    }

    /// Hide the banner. Nothing else changes.
    pub fn dismiss_error(&self) {
        self.transition(|s| s.error = None);
    }

    fn geolocation_notice(&self, error: &LocationError) -> &'static str {
        match error {
            LocationError::PermissionDenied if self.fallback == DEFAULT_COORDINATES => {
                LOCATION_DENIED_NOTICE
            }
            LocationError::Unsupported => LOCATION_UNSUPPORTED_NOTICE,
            _ => LOCATION_UNAVAILABLE_NOTICE,
        }
    }

    fn begin_cycle(&self, known_label: Option<&str>) -> u64 {
        self.transition(|s| {
            s.generation += 1;
            s.phase = Phase::ResolvingLocation;
            s.loading = true;
            s.analyzing = false;
            s.error = None;
            s.advisory = None;
            s.label = known_label.unwrap_or(RESOLVING_LABEL).to_string();
            s.generation
        })
    }

    async fn complete_cycle(&self, generation: u64, at: Coordinates, known_label: Option<String>) {
        tracing::info!(
            "Cycle {}: fetching weather for {:.4}, {:.4}",
            generation,
            at.latitude,
            at.longitude
        );

        let (fetched, reverse) = match &known_label {
            Some(_) => (self.weather.fetch_current_and_forecast(at).await, None),
            None => {
                let (fetched, reverse) = tokio::join!(
                    self.weather.fetch_current_and_forecast(at),
                    self.weather.reverse_geocode(at),
                );
                (fetched, Some(reverse))
            }
        };

        let snapshot = match fetched {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::error!("Cycle {}: weather fetch failed: {}", generation, e);
                let message = e.user_message();
                self.transition_if_current(generation, |s| {
                    s.phase = Phase::Failed;
                    s.loading = false;
                    s.analyzing = false;
                    s.error = Some(Banner::error(message));
                });
                return;
            }
        };

        let label = resolve_label(known_label, reverse, &snapshot);
        let published = self.transition_if_current(generation, |s| {
            s.phase = Phase::WeatherReady;
            s.label = label;
            s.snapshot = Some(Arc::clone(&snapshot));
            s.loading = false;
        });
        if !published {
            return;
        }

        self.transition_if_current(generation, |s| {
            s.phase = Phase::InferringAdvice;
            s.analyzing = true;
        });

        let advisory = self.advisor.infer_advice(&snapshot).await;

        if self.transition_if_current(generation, |s| {
            s.phase = Phase::AdviceReady;
            s.advisory = Some(Arc::new(advisory));
            s.analyzing = false;
        }) {
            tracing::info!("Cycle {}: advice ready", generation);
        }
    }

    fn fail_search(&self, generation: u64, message: String) {
        self.transition_if_current(generation, |s| {
            s.phase = Phase::Failed;
            s.loading = false;
            s.error = Some(Banner::error(message));
            if s.snapshot.is_some() {
                s.label = UNKNOWN_LOCATION_LABEL.to_string();
            }
        });
    }

    fn transition<R>(&self, apply: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut state = self.state.lock();
        let result = apply(&mut state);
        self.publish(&state);
        result
    }

    /// Apply only if no newer cycle has started. Returns whether it applied.
    fn transition_if_current(&self, generation: u64, apply: impl FnOnce(&mut ViewState)) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(
                "Dropping result of superseded cycle {} (current {})",
                generation,
                state.generation
            );
            return false;
        }
        apply(&mut state);
        self.publish(&state);
        true
    }

    fn publish(&self, state: &ViewState) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(state.clone());
        }
    }
}

/// Caller's label, else the reverse-geocoded name, else the provider's own place name.
pub fn resolve_label(
    known_label: Option<String>,
    reverse: Option<Lookup<PlaceName>>,
    snapshot: &WeatherSnapshot,
) -> String {
    if let Some(label) = known_label {
        return label;
    }

    match reverse {
        Some(Lookup::Found(place)) => place.label(),
        Some(Lookup::Unavailable(reason)) => {
            tracing::debug!("Reverse geocode unavailable ({}), using provider name", reason);
            snapshot.provider_label()
        }
        Some(Lookup::NoMatch) | None => snapshot.provider_label(),
    }
}
