//! Controller-level errors.
//!
//! A fetch failure never escapes a controller. It is logged with its cause and
//! stored in controller state behind a generic, user-facing message.

use std::sync::Arc;
use thiserror::Error;

/// Message shown when a list page fails to load
pub const LIST_LOAD_FAILED: &str = "Failed to load data";

/// Message shown when a live search fails
pub const SEARCH_FAILED: &str = "Search failed";

/// Message shown in place of a detail page section that failed
pub const SECTION_FAILED: &str = "Not available right now";

/// A swallowed fetch failure, kept for display and diagnostics
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ControllerError {
    /// Generic message safe to show to the user
    pub message: &'static str,
    /// The underlying failure, never shown verbatim
    pub cause: Arc<anyhow::Error>,
}

impl ControllerError {
    pub fn new(message: &'static str, cause: anyhow::Error) -> Self {
        Self {
            message,
            cause: Arc::new(cause),
        }
    }

    /// The underlying error, for logs
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}
