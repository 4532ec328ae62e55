//! Error types for upstream fetches and refresh cycles

use thiserror::Error;

/// Why a single upstream attempt failed.
///
/// Every variant short of [`FetchError::AllSourcesExhausted`] only ever moves
/// a fallback chain on to its next source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {source_name} timed out")]
    Timeout { source_name: String },

    #[error("{source_name} rejected the request: {message}")]
    AuthRejected {
        source_name: String,
        message: String,
    },

    #[error("malformed response from {source_name}: {reason}")]
    MalformedResponse { source_name: String, reason: String },

    #[error("HTTP error: {status} from {source_name}")]
    Http {
        source_name: String,
        status: reqwest::StatusCode,
    },

    #[error("transport error talking to {source_name}: {message}")]
    Transport {
        source_name: String,
        message: String,
    },

    #[error("no API key configured for {source_name}")]
    MissingCredential { source_name: String },

    #[error("all {chain} sources failed")]
    AllSourcesExhausted { chain: String },
}

impl FetchError {
    /// Classifies a `reqwest` failure for the named source.
    pub fn from_reqwest(source_name: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout {
                source_name: source_name.to_string(),
            };
        }
        if err.is_decode() {
            return FetchError::MalformedResponse {
                source_name: source_name.to_string(),
                reason: err.to_string(),
            };
        }
        match err.status() {
            Some(status) => FetchError::from_status(source_name, status),
            None => FetchError::Transport {
                source_name: source_name.to_string(),
                message: err.to_string(),
            },
        }
    }

    /// Maps a non-success status; 401 and 403 count as a rejected credential.
    pub fn from_status(source_name: &str, status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            FetchError::AuthRejected {
                source_name: source_name.to_string(),
                message: status.to_string(),
            }
        } else {
            FetchError::Http {
                source_name: source_name.to_string(),
                status,
            }
        }
    }

    pub fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        FetchError::MalformedResponse {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// A refresh cycle that could not produce a servable snapshot.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("exchange rate must be positive and finite, got {0}")]
    InvalidRate(f64),

    #[error("{field} must be non-negative and finite, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("{field} does not fit the target currency range: {value}")]
    Overflow { field: &'static str, value: f64 },
}
