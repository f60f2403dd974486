//! Query parameters accepted by the list endpoints.

use shared::{FilterState, MediaKind};

/// Jikan caps every `limit` at 25
pub const MAX_LIMIT: u32 = 25;

/// Clamp a requested page size into what the API accepts
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// Parameters for `/anime` and `/manga` search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub kind: MediaKind,
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub filters: FilterState,
    pub sfw: bool,
}

impl SearchParams {
    /// A plain title search with default filters
    pub fn new(kind: MediaKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
            page: 1,
            limit: MAX_LIMIT,
            filters: FilterState::default(),
            sfw: true,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = clamp_limit(limit);
        self
    }

    pub fn filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    /// Query pairs in the form the API expects
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let f = &self.filters;
        let mut query = vec![
            ("q", self.query.trim().to_string()),
            ("page", self.page.to_string()),
            ("limit", clamp_limit(self.limit).to_string()),
            ("order_by", f.order_by.clone()),
            ("sort", f.sort.as_str().to_string()),
        ];

        if let Some(media_type) = &f.media_type {
            query.push(("type", media_type.clone()));
        }
        if let Some(status) = &f.status {
            query.push(("status", status.clone()));
        }
        if self.kind == MediaKind::Anime {
            if let Some(rating) = &f.rating {
                query.push(("rating", rating.clone()));
            }
        }
        if !f.genres.is_empty() {
            query.push(("genres", f.genres_param()));
        }
        if let Some(score) = f.min_score {
            query.push(("min_score", score.to_string()));
        }
        if let Some(score) = f.max_score {
            query.push(("max_score", score.to_string()));
        }
        if let Some(date) = f.start_date() {
            query.push(("start_date", date));
        }
        if let Some(date) = f.end_date() {
            query.push(("end_date", date));
        }
        if self.sfw {
            query.push(("sfw", "true".to_string()));
        }

        query
    }
}

/// Ranking filters for `/top/anime`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopAnimeFilter {
    Airing,
    Upcoming,
    ByPopularity,
    Favorite,
}

impl TopAnimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopAnimeFilter::Airing => "airing",
            TopAnimeFilter::Upcoming => "upcoming",
            TopAnimeFilter::ByPopularity => "bypopularity",
            TopAnimeFilter::Favorite => "favorite",
        }
    }
}

impl std::str::FromStr for TopAnimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "airing" => Ok(TopAnimeFilter::Airing),
            "upcoming" => Ok(TopAnimeFilter::Upcoming),
            "bypopularity" => Ok(TopAnimeFilter::ByPopularity),
            "favorite" => Ok(TopAnimeFilter::Favorite),
            other => Err(format!("Unknown top anime filter: {}", other)),
        }
    }
}

/// Ranking filters for `/top/manga`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopMangaFilter {
    Publishing,
    Upcoming,
    ByPopularity,
    Favorite,
}

impl TopMangaFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopMangaFilter::Publishing => "publishing",
            TopMangaFilter::Upcoming => "upcoming",
            TopMangaFilter::ByPopularity => "bypopularity",
            TopMangaFilter::Favorite => "favorite",
        }
    }
}

impl std::str::FromStr for TopMangaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publishing" => Ok(TopMangaFilter::Publishing),
            "upcoming" => Ok(TopMangaFilter::Upcoming),
            "bypopularity" => Ok(TopMangaFilter::ByPopularity),
            "favorite" => Ok(TopMangaFilter::Favorite),
            other => Err(format!("Unknown top manga filter: {}", other)),
        }
    }
}
