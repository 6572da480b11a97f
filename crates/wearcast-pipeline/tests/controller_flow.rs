//! Controller tests against in-memory gateways.
//!
//! The fakes count their calls so the tests can check which network
//! operations a cycle performed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;
use wearcast_advice::{AdviceGateway, Advisory};
use wearcast_pipeline::{
    BannerKind, Phase, ViewState, WeatherController, LOCATION_DENIED_NOTICE,
    LOCATION_UNSUPPORTED_NOTICE, SEARCH_FAILED_MESSAGE, UNKNOWN_LOCATION_LABEL,
};
use wearcast_weather::{
    Condition, Coordinates, CurrentConditions, ForecastEntry, ForecastSeries, GeoMatch,
    LocationError, LocationSource, Lookup, PlaceName, WeatherError, WeatherGateway,
    WeatherSnapshot, Wind, DEFAULT_COORDINATES,
};

#[derive(Clone, Copy)]
enum Failure {
    Status,
    MissingKey,
}

struct FakeWeather {
    failure: Mutex<Option<Failure>>,
    reverse: Mutex<Lookup<PlaceName>>,
    forward: Mutex<Lookup<GeoMatch>>,
    forecast_len: usize,
    fetches: Mutex<Vec<Coordinates>>,
    reverse_calls: AtomicUsize,
    forward_calls: AtomicUsize,
}

impl FakeWeather {
    fn new() -> Self {
        Self {
            failure: Mutex::new(None),
            reverse: Mutex::new(Lookup::NoMatch),
            forward: Mutex::new(Lookup::NoMatch),
            forecast_len: 40,
            fetches: Mutex::new(Vec::new()),
            reverse_calls: AtomicUsize::new(0),
            forward_calls: AtomicUsize::new(0),
        }
    }

    fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock() = failure;
    }

    fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    fn last_fetch(&self) -> Option<Coordinates> {
        self.fetches.lock().last().copied()
    }

    fn reverse_count(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    fn forward_count(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }
}

fn condition() -> Condition {
    Condition {
        id: 801,
        main: "Clouds".into(),
        description: "few clouds".into(),
        icon: "02d".into(),
    }
}

fn snapshot_at(at: Coordinates, temperature: f64, forecast_len: usize) -> WeatherSnapshot {
    let now = Utc::now();
    let wind = Wind {
        speed: 3.0,
        direction: 180.0,
        gust: None,
    };

    WeatherSnapshot {
        current: CurrentConditions {
            coordinates: at,
            temperature,
            feels_like: temperature - 1.0,
            temp_min: temperature - 2.0,
            temp_max: temperature + 2.0,
            pressure: 1013.0,
            humidity: 50,
            wind,
            conditions: vec![condition()],
            observed_at: now,
            place: PlaceName::new("Springfield", "US"),
            sunrise: None,
            sunset: None,
        },
        forecast: ForecastSeries {
            entries: (0..forecast_len)
                .map(|i| ForecastEntry {
                    time: now + chrono::Duration::hours(3 * i as i64),
                    time_text: format!("slot {}", i),
                    temperature: temperature + i as f64,
                    feels_like: temperature,
                    temp_min: temperature,
                    temp_max: temperature,
                    humidity: 50,
                    conditions: vec![condition()],
                    wind,
                    precipitation_probability: 0.2,
                })
                .collect(),
            city: None,
        },
        fetched_at: now,
    }
}

#[async_trait]
impl WeatherGateway for FakeWeather {
    async fn fetch_current_and_forecast(
        &self,
        at: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let count = {
            let mut fetches = self.fetches.lock();
            fetches.push(at);
            fetches.len()
        };

        let failure = *self.failure.lock();
        match failure {
            Some(Failure::Status) => Err(WeatherError::Status {
                endpoint: "current weather",
                status: 500,
            }),
            Some(Failure::MissingKey) => Err(WeatherError::MissingApiKey),
            None => Ok(snapshot_at(at, 10.0 + count as f64, self.forecast_len)),
        }
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Lookup<PlaceName> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.reverse.lock().clone()
    }

    async fn forward_geocode(&self, _query: &str) -> Result<Lookup<GeoMatch>, WeatherError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        let failure = *self.failure.lock();
        match failure {
            Some(Failure::MissingKey) => Err(WeatherError::MissingApiKey),
            _ => Ok(self.forward.lock().clone()),
        }
    }
}

/// Advice whose summary names the temperature it was computed from
struct FakeAdvisor {
    calls: AtomicUsize,
    first_call_gate: Option<Arc<Notify>>,
}

impl FakeAdvisor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            first_call_gate: None,
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            first_call_gate: Some(gate),
        }
    }

    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn summary_for(temperature: f64) -> String {
    format!("Dress for {:.1}", temperature)
}

#[async_trait]
impl AdviceGateway for FakeAdvisor {
    async fn infer_advice(&self, snapshot: &WeatherSnapshot) -> Advisory {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            if let Some(gate) = &self.first_call_gate {
                gate.notified().await;
            }
        }

        Advisory {
            summary: summary_for(snapshot.current.temperature),
            ..Advisory::fallback()
        }
    }
}

struct FakeLocator {
    result: Result<Coordinates, LocationError>,
    calls: AtomicUsize,
}

impl FakeLocator {
    fn new(result: Result<Coordinates, LocationError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LocationSource for FakeLocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

const PARIS: Coordinates = Coordinates::new(48.8566, 2.3522);

struct Harness {
    weather: Arc<FakeWeather>,
    advisor: Arc<FakeAdvisor>,
    locator: Arc<FakeLocator>,
    controller: Arc<WeatherController>,
}

fn harness_with(
    weather: FakeWeather,
    advisor: FakeAdvisor,
    position: Result<Coordinates, LocationError>,
) -> Harness {
    let weather = Arc::new(weather);
    let advisor = Arc::new(advisor);
    let locator = Arc::new(FakeLocator::new(position));
    let controller = Arc::new(WeatherController::new(
        weather.clone(),
        advisor.clone(),
        locator.clone(),
    ));

    Harness {
        weather,
        advisor,
        locator,
        controller,
    }
}

fn harness() -> Harness {
    harness_with(FakeWeather::new(), FakeAdvisor::new(), Ok(PARIS))
}

/// The advisory on screen was computed from the snapshot on screen
fn assert_paired(state: &ViewState) {
    let paired = match (&state.snapshot, &state.advisory) {
        (Some(snapshot), Some(advisory)) => {
            advisory.summary == summary_for(snapshot.current.temperature)
        }
        _ => false,
    };
    assert!(paired, "advice does not match weather for {}", state.label);
}

#[tokio::test]
async fn test_cycle_with_label_skips_reverse_geocode() {
    let h = harness();

    h.controller
        .run_location_cycle(PARIS, Some("Paris, FR".into()))
        .await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AdviceReady);
    assert_eq!(state.label, "Paris, FR");
    assert_eq!(h.weather.reverse_count(), 0);
    assert_eq!(h.weather.fetch_count(), 1);
    assert_eq!(h.advisor.count(), 1);
    assert!(!state.loading);
    assert!(!state.analyzing);
    assert!(state.error.is_none());
    assert_paired(&state);
}

#[tokio::test]
async fn test_cycle_falls_back_to_provider_place_name() {
    let h = harness();

    h.controller.run_location_cycle(PARIS, None).await;

    let state = h.controller.state();
    assert_eq!(h.weather.reverse_count(), 1);
    assert_eq!(state.label, "Springfield, US");
    assert_eq!(state.phase, Phase::AdviceReady);
}

#[tokio::test]
async fn test_cycle_uses_reverse_geocoded_name() {
    let weather = FakeWeather::new();
    *weather.reverse.lock() = Lookup::Found(PlaceName::new("Shelbyville", "US"));
    let h = harness_with(weather, FakeAdvisor::new(), Ok(PARIS));

    h.controller.run_location_cycle(PARIS, None).await;

    assert_eq!(h.controller.state().label, "Shelbyville, US");
}

#[tokio::test]
async fn test_reverse_geocode_outage_does_not_abort_cycle() {
    let weather = FakeWeather::new();
    *weather.reverse.lock() = Lookup::Unavailable("connection refused".into());
    let h = harness_with(weather, FakeAdvisor::new(), Ok(PARIS));

    h.controller.run_location_cycle(PARIS, None).await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::AdviceReady);
    assert_eq!(state.label, "Springfield, US");
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_transitions_publish_weather_before_advice() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let weather = Arc::new(FakeWeather::new());
    let advisor = Arc::new(FakeAdvisor::new());
    let locator = Arc::new(FakeLocator::new(Ok(PARIS)));
    let controller = WeatherController::new(weather, advisor, locator).with_observer(tx);

    controller
        .run_location_cycle(PARIS, Some("Paris, FR".into()))
        .await;

    let mut seen = Vec::new();
    while let Ok(state) = rx.try_recv() {
        seen.push(state);
    }
    let phases: Vec<Phase> = seen.iter().map(|s| s.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::ResolvingLocation,
            Phase::WeatherReady,
            Phase::InferringAdvice,
            Phase::AdviceReady,
        ]
    );

    assert!(seen[0].loading);
    assert!(seen[0].snapshot.is_none());

    let weather_ready = &seen[1];
    assert!(!weather_ready.loading);
    assert!(weather_ready.snapshot.is_some());
    assert!(weather_ready.advisory.is_none());

    assert!(seen[2].analyzing);
    assert!(seen[2].advice_pending());

    assert!(!seen[3].analyzing);
    assert_paired(&seen[3]);
}

#[tokio::test]
async fn test_new_cycle_clears_previous_advice() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let weather = Arc::new(FakeWeather::new());
    let advisor = Arc::new(FakeAdvisor::new());
    let locator = Arc::new(FakeLocator::new(Ok(PARIS)));
    let controller = WeatherController::new(weather, advisor, locator).with_observer(tx);

    controller.run_location_cycle(PARIS, Some("A".into())).await;
    while rx.try_recv().is_ok() {}

    controller.run_location_cycle(PARIS, Some("B".into())).await;

    let mut second = Vec::new();
    while let Ok(state) = rx.try_recv() {
        second.push(state);
    }
    assert!(second[0].advisory.is_none());
    // Every published state is either unpaired or correctly paired
    for state in second.iter().filter(|s| s.advisory.is_some()) {
        assert_paired(state);
    }
}

#[tokio::test]
async fn test_short_term_forecast_is_eight_entries() {
    let h = harness();

    h.controller.run_location_cycle(PARIS, None).await;

    let state = h.controller.state();
    let snapshot = state.snapshot.as_ref().expect("snapshot present");
    assert_eq!(snapshot.forecast.entries.len(), 40);
    assert_eq!(snapshot.forecast.short_term().len(), 8);
    assert_eq!(state.short_term_points().len(), 8);
}

#[tokio::test]
async fn test_weather_failure_keeps_previous_snapshot() {
    let h = harness();
    h.controller
        .run_location_cycle(PARIS, Some("Paris, FR".into()))
        .await;
    let before = h.controller.state();

    h.weather.fail_with(Some(Failure::Status));
    h.controller
        .run_location_cycle(DEFAULT_COORDINATES, Some("New York, US".into()))
        .await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(!state.loading);
    assert_eq!(state.error_message(), Some("Failed to fetch current weather"));
    assert_eq!(state.error.as_ref().map(|b| b.kind), Some(BannerKind::Error));
    assert_eq!(state.snapshot, before.snapshot);
    // No advice is inferred without fresh weather
    assert_eq!(h.advisor.count(), 1);
    assert!(state.advisory.is_none());
}

#[tokio::test]
async fn test_missing_api_key_message_is_verbatim() {
    let h = harness();
    h.weather.fail_with(Some(Failure::MissingKey));

    h.controller.run_location_cycle(PARIS, None).await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(
        state.error_message(),
        Some(WeatherError::MissingApiKey.to_string().as_str())
    );
}

#[tokio::test]
async fn test_blank_search_is_a_no_op() {
    let h = harness();
    let before = h.controller.state();

    h.controller.run_search_cycle("").await;
    h.controller.run_search_cycle("   \t").await;

    assert_eq!(h.controller.state(), before);
    assert_eq!(h.weather.forward_count(), 0);
    assert_eq!(h.weather.fetch_count(), 0);
}

#[tokio::test]
async fn test_search_match_runs_cycle_with_place_label() {
    let melbourne = Coordinates::new(-37.8136, 144.9631);
    let weather = FakeWeather::new();
    *weather.forward.lock() = Lookup::Found(GeoMatch {
        coordinates: melbourne,
        place: PlaceName::new("Melbourne", "AU"),
    });
    let h = harness_with(weather, FakeAdvisor::new(), Ok(PARIS));

    h.controller.run_search_cycle("  Melbourne ").await;

    let state = h.controller.state();
    assert_eq!(state.label, "Melbourne, AU");
    assert_eq!(state.phase, Phase::AdviceReady);
    assert_eq!(h.weather.last_fetch(), Some(melbourne));
    assert_eq!(h.weather.reverse_count(), 0);
    assert_paired(&state);
}

#[tokio::test]
async fn test_search_without_match_reports_city() {
    let h = harness();
    h.controller
        .run_location_cycle(PARIS, Some("Paris, FR".into()))
        .await;

    h.controller.run_search_cycle("Nowhereville").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(!state.loading);
    let message = state.error_message().unwrap_or_default();
    assert!(message.contains("Nowhereville"));
    assert_eq!(state.label, UNKNOWN_LOCATION_LABEL);
    // Older weather stays visible
    assert!(state.snapshot.is_some());
    assert_eq!(h.weather.fetch_count(), 1);
}

#[tokio::test]
async fn test_search_without_match_before_any_weather() {
    let h = harness();

    h.controller.run_search_cycle("Nowhereville").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state.snapshot.is_none());
    assert_ne!(state.label, UNKNOWN_LOCATION_LABEL);
}

#[tokio::test]
async fn test_search_transport_failure() {
    let weather = FakeWeather::new();
    *weather.forward.lock() = Lookup::Unavailable("timed out".into());
    let h = harness_with(weather, FakeAdvisor::new(), Ok(PARIS));

    h.controller.run_search_cycle("Paris").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.error_message(), Some(SEARCH_FAILED_MESSAGE));
    assert_eq!(h.weather.fetch_count(), 0);
}

#[tokio::test]
async fn test_search_without_api_key_names_the_key() {
    let weather = FakeWeather::new();
    weather.fail_with(Some(Failure::MissingKey));
    let h = harness_with(weather, FakeAdvisor::new(), Ok(PARIS));

    h.controller.run_search_cycle("Paris").await;

    let state = h.controller.state();
    assert_eq!(state.phase, Phase::Failed);
    let banner = state.error.as_ref().expect("error present");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.message, WeatherError::MissingApiKey.user_message());
    assert!(banner.message.contains("OPENWEATHER_API_KEY"));
    assert_ne!(banner.message, SEARCH_FAILED_MESSAGE);
    assert!(!state.loading);
    assert_eq!(h.weather.forward_count(), 1);
    assert_eq!(h.weather.fetch_count(), 0);
}

#[tokio::test]
async fn test_refresh_reuses_location_and_label() {
    let h = harness();
    h.controller
        .run_location_cycle(PARIS, Some("Paris, FR".into()))
        .await;
    let first = h.controller.state();

    h.controller.refresh().await;
    let second = h.controller.state();
    h.controller.refresh().await;
    let third = h.controller.state();

    for state in [&first, &second, &third] {
        assert_eq!(state.label, "Paris, FR");
        assert_eq!(state.phase, Phase::AdviceReady);
        assert_paired(state);
    }
    assert!(second.generation > first.generation);
    assert!(third.generation > second.generation);
    assert_ne!(first.snapshot, third.snapshot);
    assert_eq!(h.weather.fetch_count(), 3);
    assert_eq!(h.weather.reverse_count(), 0);
    assert_eq!(h.weather.last_fetch(), Some(PARIS));
}

#[tokio::test]
async fn test_refresh_without_weather_requests_location() {
    let h = harness();

    h.controller.refresh().await;

    assert_eq!(h.locator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.weather.last_fetch(), Some(PARIS));
    assert_eq!(h.controller.state().phase, Phase::AdviceReady);
}

#[tokio::test]
async fn test_granted_location_reverse_geocodes() {
    let h = harness();

    h.controller.request_location().await;

    let state = h.controller.state();
    assert_eq!(h.weather.last_fetch(), Some(PARIS));
    assert_eq!(h.weather.reverse_count(), 1);
    assert!(state.error.is_none());
    assert_paired(&state);
}

#[tokio::test]
async fn test_denied_location_uses_default_with_notice() {
    let h = harness_with(
        FakeWeather::new(),
        FakeAdvisor::new(),
        Err(LocationError::PermissionDenied),
    );

    h.controller.request_location().await;

    let state = h.controller.state();
    assert_eq!(h.weather.last_fetch(), Some(DEFAULT_COORDINATES));
    assert_eq!(state.phase, Phase::AdviceReady);
    let banner = state.error.as_ref().expect("notice present");
    assert_eq!(banner.kind, BannerKind::Info);
    assert_eq!(banner.message, LOCATION_DENIED_NOTICE);
}

#[tokio::test]
async fn test_unsupported_location_uses_configured_fallback() {
    let london = Coordinates::new(51.5074, -0.1278);
    let weather = Arc::new(FakeWeather::new());
    let controller = WeatherController::new(
        weather.clone(),
        Arc::new(FakeAdvisor::new()),
        Arc::new(FakeLocator::new(Err(LocationError::Unsupported))),
    )
    .with_fallback(london);

    controller.request_location().await;

    assert_eq!(weather.last_fetch(), Some(london));
    assert_eq!(
        controller.state().error_message(),
        Some(LOCATION_UNSUPPORTED_NOTICE)
    );
}

#[tokio::test]
async fn test_fetch_failure_replaces_location_notice() {
    let weather = FakeWeather::new();
    weather.fail_with(Some(Failure::Status));
    let h = harness_with(
        weather,
        FakeAdvisor::new(),
        Err(LocationError::PermissionDenied),
    );

    h.controller.request_location().await;

    let state = h.controller.state();
    let banner = state.error.as_ref().expect("error present");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.message, "Failed to fetch current weather");
}

#[tokio::test]
async fn test_dismiss_error_only_clears_banner() {
    let h = harness();
    h.controller.run_search_cycle("Nowhereville").await;
    let before = h.controller.state();
    assert!(before.error.is_some());

    h.controller.dismiss_error();

    let after = h.controller.state();
    assert!(after.error.is_none());
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.label, before.label);
    assert_eq!(after.generation, before.generation);
    assert_eq!(h.weather.forward_count(), 1);
}

#[tokio::test]
async fn test_superseded_cycle_result_is_discarded() {
    let gate = Arc::new(Notify::new());
    let h = harness_with(FakeWeather::new(), FakeAdvisor::gated(gate.clone()), Ok(PARIS));

    let controller = h.controller.clone();
    let first = tokio::spawn(async move {
        controller
            .run_location_cycle(PARIS, Some("First".into()))
            .await;
    });

    // Wait until the first cycle is stuck in advice inference
    for _ in 0..200 {
        if h.advisor.count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(h.advisor.count(), 1);

    h.controller
        .run_location_cycle(DEFAULT_COORDINATES, Some("Second".into()))
        .await;
    gate.notify_one();
    first.await.unwrap();

    let state = h.controller.state();
    assert_eq!(state.label, "Second");
    assert_eq!(state.phase, Phase::AdviceReady);
    assert_eq!(
        state.snapshot.as_ref().map(|s| s.coordinates()),
        Some(DEFAULT_COORDINATES)
    );
    assert_paired(&state);
}

#[tokio::test]
async fn test_refresh_ignored_while_advice_in_flight() {
    let gate = Arc::new(Notify::new());
    let h = harness_with(FakeWeather::new(), FakeAdvisor::gated(gate.clone()), Ok(PARIS));

    let controller = h.controller.clone();
    let first = tokio::spawn(async move {
        controller
            .run_location_cycle(PARIS, Some("Paris, FR".into()))
            .await;
    });

    for _ in 0..200 {
        if h.advisor.count() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.controller.state().is_busy());

    let before = h.controller.state().generation;
    h.controller.refresh().await;
    assert_eq!(h.controller.state().generation, before);
    assert_eq!(h.weather.fetch_count(), 1);

    gate.notify_one();
    first.await.unwrap();
    assert!(!h.controller.state().is_busy());

    h.controller.refresh().await;
    assert_eq!(h.weather.fetch_count(), 2);
    assert_eq!(h.controller.state().phase, Phase::AdviceReady);
}
