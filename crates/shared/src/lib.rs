//! Shared library for the anidex catalog client.
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management
//! - Logging infrastructure
//! - Domain records (anime and manga summaries and details)
//! - Search filter state and its URL form

pub mod config;
pub mod filters;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use filters::{FilterState, SortDirection};
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
