//! Gemini structured-output client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use wearcast_core::is_placeholder_key;
use wearcast_weather::WeatherSnapshot;

use crate::digest::{build_prompt, WeatherDigest};
use crate::error::AdviceError;
use crate::schema::advice_schema;
use crate::types::Advisory;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Turns a weather snapshot into outfit advice.
#[async_trait]
pub trait AdviceGateway: Send + Sync {
    /// Always returns an advisory. Implementations absorb every failure and
    /// return `Advisory::fallback()` instead.
    async fn infer_advice(&self, snapshot: &WeatherSnapshot) -> Advisory;
}

#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AdviceError> {
        Self::with_timeout(api_key, model, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdviceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One inference attempt with every failure surfaced.
    #[instrument(skip(self, snapshot), fields(model = %self.model), level = "info")]
    pub async fn try_infer(&self, snapshot: &WeatherSnapshot) -> Result<Advisory, AdviceError> {
        if is_placeholder_key(&self.api_key) {
            return Err(AdviceError::MissingApiKey);
        }

        let digest = WeatherDigest::from_snapshot(snapshot);
        let prompt = build_prompt(&digest)?;

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": advice_schema(),
            },
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdviceError::Status(status.as_u16()));
        }

        let reply: GenerateContentResponse = response.json().await?;
        let text = reply.text().ok_or(AdviceError::EmptyResponse)?;

        let advisory: Advisory = serde_json::from_str(&text)?;
        advisory.validate()?;
        Ok(advisory)
    }
}

#[async_trait]
impl AdviceGateway for GeminiAdvisor {
    async fn infer_advice(&self, snapshot: &WeatherSnapshot) -> Advisory {
        match self.try_infer(snapshot).await {
            Ok(advisory) => {
                tracing::info!("Advice ready: {}", advisory.summary);
                advisory
            }
            Err(e) if e.is_content_error() => {
                tracing::warn!("Gemini response rejected, using fallback advice: {}", e);
                Advisory::fallback()
            }
            Err(e) => {
                tracing::warn!("Gemini analysis failed, using fallback advice: {}", e);
                Advisory::fallback()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined; `None` when blank.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
