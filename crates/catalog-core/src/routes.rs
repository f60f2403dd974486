//! Navigation targets.
//!
//! Routes are plain values the controllers hand back to their owner. The
//! search route carries the serialized filters so a search can be shared
//! and reopened from its path alone. Anime searches live at `/search`, manga
//! searches at `/manga/search`.

use shared::filters::{encode_query, parse_query};
use shared::{FilterState, MediaKind, Record};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Home,
    AnimeDetail(u32),
    MangaDetail(u32),
    Search {
        kind: MediaKind,
        query: String,
        filters: FilterState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Unknown route: {0}")]
    Unknown(String),

    #[error("Invalid id in route: {0}")]
    InvalidId(String),
}

impl Route {
    /// Detail route for a record id of the given kind
    pub fn detail(kind: MediaKind, id: u32) -> Self {
        match kind {
            MediaKind::Anime => Route::AnimeDetail(id),
            MediaKind::Manga => Route::MangaDetail(id),
        }
    }

    /// Detail route for a record
    pub fn for_record<R: Record + ?Sized>(record: &R) -> Self {
        Self::detail(record.kind(), record.id())
    }

    /// Full anime search with default filters
    pub fn search(query: impl Into<String>) -> Self {
        Self::search_for(MediaKind::Anime, query)
    }

    /// Full search of the given kind with default filters
    pub fn search_for(kind: MediaKind, query: impl Into<String>) -> Self {
        Route::Search {
            kind,
            query: query.into(),
            filters: FilterState::default(),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::AnimeDetail(id) => format!("/anime/{}", id),
            Route::MangaDetail(id) => format!("/manga/{}", id),
            Route::Search {
                kind,
                query,
                filters,
            } => {
                let base = match kind {
                    MediaKind::Anime => "/search",
                    MediaKind::Manga => "/manga/search",
                };
                let mut pairs: Vec<(&str, String)> = Vec::new();
                if !query.trim().is_empty() {
                    pairs.push(("q", query.trim().to_string()));
                }
                pairs.extend(filters.to_query_pairs());

                if pairs.is_empty() {
                    base.to_string()
                } else {
                    format!("{}?{}", base, encode_query(&pairs))
                }
            }
        }
    }

    /// Parse a path produced by `to_path`. A full URL is accepted too; only
    /// its path and query are looked at.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let input = input.trim();
        let path = match input.find("://") {
            Some(scheme_end) => {
                let rest = &input[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => input,
        };

        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["search"] => Ok(search_route(MediaKind::Anime, query)),
            ["manga", "search"] => Ok(search_route(MediaKind::Manga, query)),
            ["anime", id] => Ok(Route::AnimeDetail(parse_id(id)?)),
            ["manga", id] => Ok(Route::MangaDetail(parse_id(id)?)),
            _ => Err(RouteError::Unknown(input.to_string())),
        }
    }
}

fn search_route(kind: MediaKind, query: &str) -> Route {
    let pairs = parse_query(query);
    let search = pairs
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    let filters = FilterState::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Route::Search {
        kind,
        query: search,
        filters,
    }
}

fn parse_id(raw: &str) -> Result<u32, RouteError> {
    raw.parse::<u32>()
        .map_err(|_| RouteError::InvalidId(raw.to_string()))
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}
