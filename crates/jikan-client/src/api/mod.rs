//! Jikan API v4 client implementation.
//!
//! This module provides a rate-limited, retry-enabled, memoizing client for
//! the Jikan API (MyAnimeList unofficial API).

pub mod client;
pub mod error;
pub mod params;
pub mod rate_limiter;
pub mod types;

pub use client::JikanClient;
pub use error::{JikanError, JikanResult};
pub use params::{SearchParams, TopAnimeFilter, TopMangaFilter};
pub use rate_limiter::RateLimiter;
pub use types::*;
