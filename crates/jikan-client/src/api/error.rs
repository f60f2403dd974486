//! Errors produced by the Jikan client.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JikanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Rate limited by server after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl JikanError {
    /// Whether a retry has any chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            JikanError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            JikanError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub type JikanResult<T> = std::result::Result<T, JikanError>;
