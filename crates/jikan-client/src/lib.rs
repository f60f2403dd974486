//! Client library for the Jikan API v4.
//!
//! Fetches anime and manga lists, search results and detail records, and
//! memoizes responses in an explicitly shared query cache.

pub mod api;
pub mod cache;

pub use api::{JikanClient, JikanError, JikanResult, RateLimiter, SearchParams, TopAnimeFilter, TopMangaFilter};
pub use cache::{CacheStats, Freshness, QueryCache};
