//! Search filter state and its shareable URL form.
//!
//! Filters are initialized from a page's query string, mutated by the user,
//! and written back to the query string only when a search is applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default ordering field
pub const DEFAULT_ORDER_BY: &str = "score";

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Filters applied to the full search page
///
/// `None` for `media_type`, `status` and `rating` means "all".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub media_type: Option<String>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub order_by: String,
    pub sort: SortDirection,
    pub genres: Vec<u32>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            media_type: None,
            status: None,
            rating: None,
            order_by: DEFAULT_ORDER_BY.to_string(),
            sort: SortDirection::Desc,
            genres: Vec::new(),
            min_score: None,
            max_score: None,
            start_year: None,
            end_year: None,
        }
    }
}

fn non_all(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "all" {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_score(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && (0.0..=10.0).contains(s))
}

fn parse_year(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|y| *y > 0)
}

impl FilterState {
    /// Build filters from decoded query pairs; unknown keys and malformed
    /// values are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filters = Self::default();

        for (key, value) in pairs {
            match key {
                "type" => filters.media_type = non_all(value),
                "status" => filters.status = non_all(value),
                "rating" => filters.rating = non_all(value),
                "order_by" => {
                    if !value.trim().is_empty() {
                        filters.order_by = value.trim().to_string();
                    }
                }
                "sort" => {
                    if let Some(sort) = SortDirection::parse(value.trim()) {
                        filters.sort = sort;
                    }
                }
                "genres" => {
                    filters.genres = value
                        .split(',')
                        .filter_map(|id| id.trim().parse::<u32>().ok())
                        .fold(Vec::new(), |mut acc, id| {
                            if !acc.contains(&id) {
                                acc.push(id);
                            }
                            acc
                        });
                }
                "min_score" => filters.min_score = parse_score(value),
                "max_score" => filters.max_score = parse_score(value),
                "start_year" => filters.start_year = parse_year(value),
                "end_year" => filters.end_year = parse_year(value),
                _ => {}
            }
        }

        filters
    }

    /// Parse filters from a raw query string (with or without leading `?`)
    pub fn from_query_string(query: &str) -> Self {
        let pairs = parse_query(query);
        Self::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Non-default filters as URL parameters, in a fixed key order
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(media_type) = &self.media_type {
            pairs.push(("type", media_type.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(rating) = &self.rating {
            pairs.push(("rating", rating.clone()));
        }
        if self.order_by != DEFAULT_ORDER_BY {
            pairs.push(("order_by", self.order_by.clone()));
        }
        if self.sort != SortDirection::Desc {
            pairs.push(("sort", self.sort.as_str().to_string()));
        }
        if !self.genres.is_empty() {
            pairs.push(("genres", self.genres_param()));
        }
        if let Some(score) = self.min_score {
            pairs.push(("min_score", score.to_string()));
        }
        if let Some(score) = self.max_score {
            pairs.push(("max_score", score.to_string()));
        }
        if let Some(year) = self.start_year {
            pairs.push(("start_year", year.to_string()));
        }
        if let Some(year) = self.end_year {
            pairs.push(("end_year", year.to_string()));
        }

        pairs
    }

    /// Comma-joined genre ids
    pub fn genres_param(&self) -> String {
        self.genres
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Number of filters that differ from their defaults
    pub fn active_count(&self) -> usize {
        self.to_query_pairs().len()
    }

    /// Reset every filter to its default
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Add the genre if absent, remove it if present
    pub fn toggle_genre(&mut self, genre_id: u32) {
        if let Some(pos) = self.genres.iter().position(|id| *id == genre_id) {
            self.genres.remove(pos);
        } else {
            self.genres.push(genre_id);
        }
    }

    /// First day of `start_year`, as the API expects it
    pub fn start_date(&self) -> Option<String> {
        self.start_year
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .map(|date| date.format("%Y-%m-%d").to_string())
    }

    /// Last day of `end_year`, as the API expects it
    pub fn end_date(&self) -> Option<String> {
        self.end_year
            .and_then(|year| NaiveDate::from_ymd_opt(year, 12, 31))
            .map(|date| date.format("%Y-%m-%d").to_string())
    }
}

/// Split a query string into percent-decoded pairs. `+` decodes to a space.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

/// Join pairs into a percent-encoded query string (without leading `?`)
pub fn encode_query<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
