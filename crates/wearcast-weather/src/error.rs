use wearcast_core::{NetworkError, ReqwestErrorExt};

/// Device location errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unsupported")]
    Unsupported,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Missing OpenWeatherMap API key. Set OPENWEATHER_API_KEY or weather.api_key in config.toml")]
    MissingApiKey,
    #[error("Failed to fetch {endpoint}: HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Network(e.into_network_error())
    }
}

impl WeatherError {
    /// Banner text. A missing key is shown verbatim so the user knows what to set.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => self.to_string(),
            Self::Status { endpoint, .. } => format!("Failed to fetch {}", endpoint),
            Self::Network(e) => e.user_message().to_string(),
            Self::Parse(_) => "Weather data was unreadable. Please try again.".to_string(),
            Self::Url(_) => "Failed to load data".to_string(),
        }
    }
}
