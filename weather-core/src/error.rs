//! Error taxonomy for weather and location lookups.
//!
//! Display strings are user-facing: the controller stores them verbatim as its
//! error message.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Invalid API key. Please check your configuration.")]
    InvalidCredential,

    #[error("Location not found. Please check the city name.")]
    LocationNotFound,

    #[error("API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Provider(String),

    #[error("Network error. Please check your internet connection.")]
    NetworkUnavailable,

    #[error("An unexpected error occurred: {0}")]
    Client(String),
}

impl WeatherError {
    /// Fallback text when the provider gave no message of its own.
    pub const GENERIC_PROVIDER_MESSAGE: &'static str = "An error occurred fetching weather data.";

    /// Classify a non-2xx provider response.
    pub fn from_status(status: u16, provider_message: Option<String>) -> Self {
        match status {
            401 => Self::InvalidCredential,
            404 => Self::LocationNotFound,
            429 => Self::RateLimited,
            _ => Self::Provider(
                provider_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| Self::GENERIC_PROVIDER_MESSAGE.to_string()),
            ),
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Client(err.to_string())
        } else if err.is_decode() {
            Self::Provider(format!("Malformed response from weather provider: {err}"))
        } else {
            Self::NetworkUnavailable
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Failed to get current location: {0}")]
    Unavailable(String),

    #[error("Location request timed out")]
    Timeout,
}

/// Anything that can fail a controller fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Location(#[from] LocationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(WeatherError::from_status(401, None), WeatherError::InvalidCredential);
        assert_eq!(WeatherError::from_status(404, Some("city not found".into())), WeatherError::LocationNotFound);
        assert_eq!(WeatherError::from_status(429, None), WeatherError::RateLimited);
        assert_eq!(
            WeatherError::from_status(500, Some("upstream exploded".into())),
            WeatherError::Provider("upstream exploded".into())
        );
        assert_eq!(
            WeatherError::from_status(503, Some("  ".into())).to_string(),
            WeatherError::GENERIC_PROVIDER_MESSAGE
        );
    }

    #[test]
    fn fetch_error_is_transparent() {
        let err: FetchError = LocationError::PermissionDenied.into();
        assert_eq!(err.to_string(), "Location permission denied");

        let err: FetchError = WeatherError::RateLimited.into();
        assert!(err.to_string().contains("rate limit"));
    }
}
