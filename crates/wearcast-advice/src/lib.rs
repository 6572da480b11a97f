//! Outfit advice for Wearcast
//!
//! Condenses a weather snapshot into a digest, asks Gemini for a
//! schema-constrained `Advisory`, and substitutes a fixed fallback
//! whenever that cannot be completed.

pub mod digest;
pub mod error;
pub mod gemini;
pub mod schema;
pub mod types;

pub use digest::{build_prompt, WeatherDigest};
pub use error::AdviceError;
pub use gemini::{AdviceGateway, GeminiAdvisor, DEFAULT_MODEL};
pub use schema::advice_schema;
pub use types::*;
