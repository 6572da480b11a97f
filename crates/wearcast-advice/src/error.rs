//! Advice inference errors. These never leave the crate's public
//! `AdviceGateway::infer_advice`; they are logged and replaced by the fallback.

use thiserror::Error;
use wearcast_core::{NetworkError, ReqwestErrorExt};

#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Gemini API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Gemini returned status {0}")]
    Status(u16),

    #[error("Gemini returned no text")]
    EmptyResponse,

    #[error("Response did not match the advice schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid advice: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for AdviceError {
    fn from(e: reqwest::Error) -> Self {
        AdviceError::Network(e.into_network_error())
    }
}

impl AdviceError {
    /// Whether the failure came from the model's output rather than the transport.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse | Self::Malformed(_) | Self::Invalid(_)
        )
    }
}
