//! Condensed weather digest sent to the model, and the prompt around it.

use serde::Serialize;
use wearcast_weather::WeatherSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentDigest {
    pub temp: f64,
    pub feels_like: f64,
    pub condition: String,
    pub wind: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDigest {
    pub time: String,
    pub temp: f64,
    pub feels_like: f64,
    pub condition: String,
    pub rain_prob: f64,
    pub wind: f64,
}

/// Current conditions plus the short-term forecast, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherDigest {
    pub current: CurrentDigest,
    pub forecast_next_24h: Vec<ForecastDigest>,
}

impl WeatherDigest {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let current = &snapshot.current;

        Self {
            current: CurrentDigest {
                temp: current.temperature,
                feels_like: current.feels_like,
                condition: current.description().to_string(),
                wind: current.wind.speed,
                humidity: current.humidity,
            },
            forecast_next_24h: snapshot
                .forecast
                .short_term()
                .iter()
                .map(|entry| ForecastDigest {
                    time: entry.label_time(),
                    temp: entry.temperature,
                    feels_like: entry.feels_like,
                    condition: entry.description().to_string(),
                    rain_prob: entry.precipitation_probability,
                    wind: entry.wind.speed,
                })
                .collect(),
        }
    }
}

const STYLIST_INSTRUCTIONS: &str = "\
You are a minimalist meteorological stylist.

**Goal:** suggest the perfect outfit with EXTREMELY BRIEF explanations. Users are in a hurry.

**Constraints:**
- Summary: Max 8 words. Funny or direct.
- Reasoning: Max 15 words. One sentence only.

**Logic:**
1. **Base Layer:** Determine based on 'feels_like' temperature.
2. **Precipitation:** If precipitation probability (rain_prob) > 0.3, suggest rain/snow gear.
3. **Wind:** If wind speed > 8 m/s, suggest windbreakers.
4. **Temperature Swings:** Check if temp drops/rises > 8°C in 6h and raise temp_drop/temp_rise alerts.
";

/// Full prompt: instructions followed by the digest as compact JSON.
pub fn build_prompt(digest: &WeatherDigest) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string(digest)?;
    Ok(format!("{}\nData: {}\n", STYLIST_INSTRUCTIONS, data))
}
