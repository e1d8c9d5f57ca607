//! Error types for the fetch, normalize and archive stages.

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the upstream forecast API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather API key is not configured")]
    MissingCredential,

    #[error("Upstream rejected the location: {0}")]
    BadRequest(String),

    #[error("Upstream returned HTTP {0}")]
    UpstreamError(u16),

    #[error("Upstream body is not valid JSON: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredential => "The weather service is not configured. Please try later.",
            Self::BadRequest(_) => "That location was not recognised. Check the spelling.",
            Self::UpstreamError(status) if *status >= 500 => {
                "The weather service is having problems. Please try again later."
            }
            Self::UpstreamError(_) => "The weather service refused the request.",
            Self::InvalidResponse(_) => "The weather service sent an unreadable answer.",
            Self::Network(_) => "Could not reach the weather service. Check your connection.",
        }
    }
}

/// Failures turning a raw response into a `NormalizedForecast`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Response has no `days` list")]
    MissingDays,

    #[error("Day entry {index} has no date")]
    MissingDate { index: usize },

    #[error("Response contained no forecast days")]
    EmptyResult,
}

impl NormalizeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingDays | Self::MissingDate { .. } => {
                "The weather service sent an incomplete forecast."
            }
            Self::EmptyResult => "No forecast is available for that location.",
        }
    }
}

/// Failures reading or writing the on-disk archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize forecast: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Archive IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path escapes the archive directory: {0}")]
    PathTraversalRejected(String),

    #[error("Archived file not found: {0}")]
    NotFound(String),
}

impl ArchiveError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Write { .. } | Self::Serialize(_) | Self::Io(_) => {
                "The forecast history could not be accessed."
            }
            Self::PathTraversalRejected(_) | Self::NotFound(_) => "That file is not available.",
        }
    }
}

/// Failures of the results flow, as seen by the web layer.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Location is empty")]
    EmptyLocation,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyLocation => "Please enter a location.",
            Self::Fetch(e) => e.user_message(),
            Self::Normalize(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_messages_by_status() {
        assert!(FetchError::UpstreamError(503)
            .user_message()
            .contains("try again later"));
        assert!(FetchError::UpstreamError(401)
            .user_message()
            .contains("refused"));
    }

    #[test]
    fn test_forecast_error_delegates() {
        let err: ForecastError = NormalizeError::EmptyResult.into();
        assert_eq!(err.user_message(), NormalizeError::EmptyResult.user_message());

        let err: ForecastError = FetchError::MissingCredential.into();
        assert!(matches!(err, ForecastError::Fetch(FetchError::MissingCredential)));
        assert_eq!(err.to_string(), "Weather API key is not configured");
    }

    #[test]
    fn test_missing_date_display() {
        let err = NormalizeError::MissingDate { index: 3 };
        assert_eq!(err.to_string(), "Day entry 3 has no date");
    }
}
