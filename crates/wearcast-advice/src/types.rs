use serde::{Deserialize, Serialize};

use crate::error::AdviceError;

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Rain,
    Snow,
    Heat,
    Cold,
    Wind,
    Hail,
    TempDrop,
    TempRise,
    Uv,
}

impl AlertKind {
    pub const ALL: [AlertKind; 9] = [
        Self::Rain,
        Self::Snow,
        Self::Heat,
        Self::Cold,
        Self::Wind,
        Self::Hail,
        Self::TempDrop,
        Self::TempRise,
        Self::Uv,
    ];

    /// Wire name, as used in the response schema
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Heat => "heat",
            Self::Cold => "cold",
            Self::Wind => "wind",
            Self::Hail => "hail",
            Self::TempDrop => "temp_drop",
            Self::TempRise => "temp_rise",
            Self::Uv => "uv",
        }
    }
}

/// Alert severity. Ordering is for display emphasis only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Temperature trend over the next 12-24 hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureTrend {
    Stable,
    RisingSharp,
    FallingSharp,
    Fluctuating,
}

impl TemperatureTrend {
    pub const ALL: [TemperatureTrend; 4] = [
        Self::Stable,
        Self::RisingSharp,
        Self::FallingSharp,
        Self::Fluctuating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::RisingSharp => "rising_sharp",
            Self::FallingSharp => "falling_sharp",
            Self::Fluctuating => "fluctuating",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::RisingSharp => "Rising sharply",
            Self::FallingSharp => "Falling sharply",
            Self::Fluctuating => "Fluctuating",
        }
    }
}

/// Icon representing the overall condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKey {
    Sun,
    Rain,
    Cloud,
    Snow,
    Storm,
    Wind,
}

impl IconKey {
    pub const ALL: [IconKey; 6] = [
        Self::Sun,
        Self::Rain,
        Self::Cloud,
        Self::Snow,
        Self::Storm,
        Self::Wind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Rain => "rain",
            Self::Cloud => "cloud",
            Self::Snow => "snow",
            Self::Storm => "storm",
            Self::Wind => "wind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
}

/// Outfit recommendation derived from one weather snapshot.
///
/// Field names follow the response schema (`outfitTop`, `weatherIconKey`, ...).
/// Every field is required when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub summary: String,
    pub outfit_top: Vec<String>,
    pub outfit_bottom: Vec<String>,
    pub accessories: Vec<String>,
    pub alerts: Vec<Alert>,
    pub reasoning: String,
    #[serde(rename = "temperatureTrend")]
    pub trend: TemperatureTrend,
    #[serde(rename = "weatherIconKey")]
    pub icon: IconKey,
}

pub const FALLBACK_SUMMARY: &str = "Weather analysis unavailable";

impl Advisory {
    /// Fixed advice used whenever inference cannot be completed.
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            outfit_top: vec!["Standard layers".to_string()],
            outfit_bottom: vec!["Comfortable pants".to_string()],
            accessories: vec![],
            alerts: vec![Alert {
                kind: AlertKind::Cold,
                message: "AI unavailable, dress cautiously.".to_string(),
                severity: Severity::Low,
            }],
            reasoning: "Could not connect to AI stylist.".to_string(),
            trend: TemperatureTrend::Stable,
            icon: IconKey::Cloud,
        }
    }

    /// Content checks serde cannot express: blank text fields.
    pub fn validate(&self) -> Result<(), AdviceError> {
        if self.summary.trim().is_empty() {
            return Err(AdviceError::Invalid("summary is empty".to_string()));
        }
        if self.reasoning.trim().is_empty() {
            return Err(AdviceError::Invalid("reasoning is empty".to_string()));
        }
        if self.outfit_top.is_empty() && self.outfit_bottom.is_empty() {
            return Err(AdviceError::Invalid("no garments recommended".to_string()));
        }
        if let Some(alert) = self.alerts.iter().find(|a| a.message.trim().is_empty()) {
            return Err(AdviceError::Invalid(format!(
                "{} alert has no message",
                alert.kind.as_str()
            )));
        }
        Ok(())
    }

    /// Alerts ordered most severe first, stable within a severity.
    pub fn alerts_by_severity(&self) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self.alerts.iter().collect();
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        alerts
    }
}
