//! Plain-text rendering of controller states for the terminal.

use wearcast_advice::{Advisory, IconKey, Severity};
use wearcast_core::UnitSystem;
use wearcast_pipeline::{BannerKind, Phase, ViewState};
use wearcast_weather::WeatherSnapshot;

fn icon_glyph(icon: IconKey) -> &'static str {
    match icon {
        IconKey::Sun => "☀",
        IconKey::Rain => "☂",
        IconKey::Cloud => "☁",
        IconKey::Snow => "❄",
        IconKey::Storm => "⚡",
        IconKey::Wind => "≋",
    }
}

fn wind_suffix(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Imperial => "mph",
        UnitSystem::Metric | UnitSystem::Standard => "m/s",
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "HIGH",
        Severity::Medium => "MED",
        Severity::Low => "LOW",
    }
}

/// Text to print for one published state, if that state is worth printing.
pub fn render_transition(state: &ViewState, units: UnitSystem) -> Option<String> {
    match state.phase {
        Phase::Idle => None,
        Phase::ResolvingLocation => Some(format!("… {}", state.label)),
        Phase::WeatherReady => {
            let mut out = String::new();
            if let Some(banner) = render_banner(state) {
                out.push_str(&banner);
                out.push('\n');
            }
            let snapshot = state.snapshot.as_ref()?;
            out.push_str(&render_weather(&state.label, snapshot, units));
            Some(out)
        }
        Phase::InferringAdvice => Some("… Analyzing outfit".to_string()),
        Phase::AdviceReady => state.advisory.as_ref().map(|a| render_advice(a)),
        Phase::Failed => render_banner(state),
    }
}

pub fn render_banner(state: &ViewState) -> Option<String> {
    let banner = state.error.as_ref()?;
    let tag = match banner.kind {
        BannerKind::Info => "note",
        BannerKind::Error => "error",
    };
    Some(format!("[{}] {}", tag, banner.message))
}

/// Current conditions followed by the next ~24 hours.
pub fn render_weather(label: &str, snapshot: &WeatherSnapshot, units: UnitSystem) -> String {
    let current = &snapshot.current;
    let degrees = units.temperature_suffix();

    let mut lines = vec![
        format!("== {} ==", label),
        format!(
            "{:.0}{} (feels like {:.0}{}), {}",
            current.temperature,
            degrees,
            current.feels_like,
            degrees,
            current.description()
        ),
        format!(
            "Humidity {}%  Wind {:.1} {}",
            current.humidity,
            current.wind.speed,
            wind_suffix(units)
        ),
    ];

    let points = snapshot.forecast.short_term_points();
    if !points.is_empty() {
        lines.push("Next 24h:".to_string());
        lines.extend(points.iter().map(|point| {
            format!(
                "  {}  {:>4}{}  {:>3.0}%",
                point.time.format("%H:%M"),
                point.temperature,
                degrees,
                point.precipitation_percent
            )
        }));
    }

    lines.join("\n")
}

pub fn render_advice(advisory: &Advisory) -> String {
    let mut lines = vec![
        format!("{} {}", icon_glyph(advisory.icon), advisory.summary),
        format!("Top: {}", advisory.outfit_top.join(", ")),
        format!("Bottom: {}", advisory.outfit_bottom.join(", ")),
    ];
    if !advisory.accessories.is_empty() {
        lines.push(format!("Accessories: {}", advisory.accessories.join(", ")));
    }
    lines.extend(
        advisory
            .alerts_by_severity()
            .into_iter()
            .map(|alert| format!("! [{}] {}", severity_tag(alert.severity), alert.message)),
    );
    lines.push(format!("Trend: {}", advisory.trend.description()));
    lines.push(advisory.reasoning.clone());

    lines.join("\n").trim_end().to_string()
}
