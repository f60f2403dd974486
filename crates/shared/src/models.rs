//! Domain records shown by the catalog.
//!
//! These are the summaries and detail records the controllers hand to the
//! presentation layer. Apart from the identifier, every field is pass-through.

use serde::{Deserialize, Serialize};

/// Kind of media a record describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anime" => Ok(MediaKind::Anime),
            "manga" => Ok(MediaKind::Manga),
            other => Err(format!("Unknown media kind: {}", other)),
        }
    }
}

/// A record the controllers can key lists by and navigate to.
pub trait Record {
    /// Stable MyAnimeList identifier
    fn id(&self) -> u32;

    /// Which detail route the record belongs to
    fn kind(&self) -> MediaKind;

    /// Display title
    fn title(&self) -> &str;
}

/// Anime summary as shown on cards and in search previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u32,
    pub title: String,
    pub title_english: Option<String>,
    pub anime_type: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub airing: bool,
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub year: Option<i32>,
    pub image_url: Option<String>,
}

/// Manga summary as shown on cards and in search previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangaSummary {
    pub mal_id: u32,
    pub title: String,
    pub title_english: Option<String>,
    pub manga_type: Option<String>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub status: Option<String>,
    pub publishing: bool,
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub year: Option<i32>,
    pub image_url: Option<String>,
}

/// Full anime record for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetail {
    pub summary: AnimeSummary,
    pub title_japanese: Option<String>,
    pub source: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub season: Option<String>,
    pub scored_by: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub themes: Vec<String>,
    pub studios: Vec<String>,
    pub trailer_url: Option<String>,
    pub broadcast: Option<String>,
}

/// Full manga record for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangaDetail {
    pub summary: MangaSummary,
    pub title_japanese: Option<String>,
    pub scored_by: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub themes: Vec<String>,
    pub authors: Vec<String>,
    pub serializations: Vec<String>,
}

/// A character and the part they play in an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRole {
    pub mal_id: u32,
    pub name: String,
    /// "Main" or "Supporting"
    pub role: String,
    pub image_url: Option<String>,
    /// Japanese voice actors first; empty for manga
    pub voice_actors: Vec<String>,
}

/// One entry of an anime's episode list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub title: Option<String>,
    /// Air date, already formatted for display
    pub aired: Option<String>,
    pub score: Option<f64>,
    pub filler: bool,
    pub recap: bool,
}

/// A user review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub mal_id: u32,
    pub username: String,
    pub score: Option<u32>,
    /// Review date, already formatted for display
    pub date: Option<String>,
    pub text: String,
    pub tags: Vec<String>,
    pub is_spoiler: bool,
}

/// Genre with the number of entries tagged with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: u32,
    pub name: String,
    pub count: u32,
}

impl Record for AnimeSummary {
    fn id(&self) -> u32 {
        self.mal_id
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Anime
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl Record for MangaSummary {
    fn id(&self) -> u32 {
        self.mal_id
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Manga
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl AnimeSummary {
    /// A summary that only knows what a recommendation link carries
    pub fn linked(mal_id: u32, title: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            mal_id,
            title: title.into(),
            title_english: None,
            anime_type: None,
            episodes: None,
            status: None,
            airing: false,
            score: None,
            rank: None,
            year: None,
            image_url,
        }
    }
}

impl MangaSummary {
    /// A summary that only knows what a recommendation link carries
    pub fn linked(mal_id: u32, title: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            mal_id,
            title: title.into(),
            title_english: None,
            manga_type: None,
            chapters: None,
            volumes: None,
            status: None,
            publishing: false,
            score: None,
            rank: None,
            year: None,
            image_url,
        }
    }
}

/// Format a score the way cards show it
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s > 0.0 => format!("{:.1}", s),
        _ => "N/A".to_string(),
    }
}

/// Expand the API's abbreviated duration ("24 min per ep")
pub fn format_duration(duration: &str) -> String {
    duration.replace("min", "minutes")
}
