//! Response schema handed to Gemini's structured output mode.

use serde_json::{json, Value};

use crate::types::{AlertKind, IconKey, Severity, TemperatureTrend};

/// Top-level fields the model must always return.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "summary",
    "outfitTop",
    "outfitBottom",
    "accessories",
    "alerts",
    "reasoning",
    "temperatureTrend",
    "weatherIconKey",
];

fn string_list(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" },
        "description": description,
    })
}

/// Schema for `Advisory`, enum values taken from the Rust enums.
pub fn advice_schema() -> Value {
    let alert_kinds: Vec<&str> = AlertKind::ALL.iter().map(AlertKind::as_str).collect();
    let severities: Vec<&str> = Severity::ALL.iter().map(Severity::as_str).collect();
    let trends: Vec<&str> = TemperatureTrend::ALL
        .iter()
        .map(TemperatureTrend::as_str)
        .collect();
    let icons: Vec<&str> = IconKey::ALL.iter().map(IconKey::as_str).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A very short, punchy phrase (max 8 words) summarizing the vibe.",
            },
            "outfitTop": string_list(
                "List of recommended upper body clothing items (e.g., T-shirt, Hoodie)."
            ),
            "outfitBottom": string_list(
                "List of recommended lower body clothing items (e.g., Shorts, Jeans)."
            ),
            "accessories": string_list("Necessary accessories (e.g., Umbrella, Sunglasses)."),
            "alerts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "enum": alert_kinds },
                        "message": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": severities },
                    },
                    "required": ["type", "message", "severity"],
                },
                "description": "Specific warnings for extreme weather or sudden changes.",
            },
            "reasoning": {
                "type": "STRING",
                "description": "A single, short sentence (max 15 words) explaining the main factor.",
            },
            "temperatureTrend": {
                "type": "STRING",
                "enum": trends,
                "description": "The general trend of temperature over the next 12-24 hours.",
            },
            "weatherIconKey": {
                "type": "STRING",
                "enum": icons,
                "description": "The best representative icon for the overall condition.",
            },
        },
        "required": REQUIRED_FIELDS,
    })
}
