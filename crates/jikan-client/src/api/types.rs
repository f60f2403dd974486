//! Jikan API v4 response types.
//!
//! These types represent the JSON responses from the Jikan API. Fields the
//! catalog never displays are left out; everything optional defaults.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};
use shared::{
    AnimeDetail, AnimeSummary, CharacterRole, Episode, Genre, MangaDetail, MangaSummary, Review,
};

/// Generic pagination wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Simple data wrapper (without pagination)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Single-object wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub data: T,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub last_visible_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

impl<T> PaginatedResponse<T> {
    /// Whether the API reported another page
    pub fn has_next_page(&self) -> Option<bool> {
        self.pagination.as_ref().map(|p| p.has_next_page)
    }

    /// Best-effort total across all pages
    pub fn total(&self) -> Option<u32> {
        self.pagination
            .as_ref()
            .and_then(|p| p.items.as_ref())
            .map(|items| items.total)
    }

    /// Convert every entry, keeping the pagination block
    pub fn map_data<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Genre item from `/genres/anime`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreItem {
    pub mal_id: u32,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub count: u32,
}

/// Anime entry, shared by list, search and `/full` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub mal_id: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub source: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,
    #[serde(default)]
    pub aired: Option<DateRange>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub score: Option<f64>,
    pub scored_by: Option<u32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
    #[serde(default)]
    pub studios: Vec<MalEntity>,
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
}

/// Manga entry, shared by list, search and `/full` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaEntry {
    pub mal_id: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: Images,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(rename = "type")]
    pub manga_type: Option<String>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub status: Option<String>,
    #[serde(default)]
    pub publishing: bool,
    #[serde(default)]
    pub published: Option<DateRange>,
    pub score: Option<f64>,
    pub scored_by: Option<u32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub synopsis: Option<String>,
    #[serde(default)]
    pub authors: Vec<MalEntity>,
    #[serde(default)]
    pub serializations: Vec<MalEntity>,
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
}

/// Cover images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

impl Images {
    /// Preferred cover: webp first, then jpg
    pub fn best_url(&self) -> Option<String> {
        [self.webp.as_ref(), self.jpg.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|set| set.large_image_url.clone().or_else(|| set.image_url.clone()))
    }
}

/// Trailer links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trailer {
    pub youtube_id: Option<String>,
    pub url: Option<String>,
}

/// Aired / published dates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
}

impl DateRange {
    /// Year of the start date, if it parses as RFC 3339
    pub fn start_year(&self) -> Option<i32> {
        self.from
            .as_deref()
            .and_then(|from| DateTime::parse_from_rfc3339(from).ok())
            .map(|date| date.year())
    }
}

/// Broadcast information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    pub day: Option<String>,
    pub time: Option<String>,
    pub timezone: Option<String>,
    pub string: Option<String>,
}

/// MAL entity (genre, studio, author, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Entry of `/anime/{id}/characters` and `/manga/{id}/characters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterItem {
    pub character: CharacterRef,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub voice_actors: Vec<VoiceActor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRef {
    pub mal_id: u32,
    pub name: String,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceActor {
    pub person: MalEntity,
    #[serde(default)]
    pub language: String,
}

/// Entry of `/anime/{id}/episodes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeItem {
    pub mal_id: u32,
    pub title: Option<String>,
    pub aired: Option<String>,
    pub score: Option<f64>,
    #[serde(default)]
    pub filler: bool,
    #[serde(default)]
    pub recap: bool,
}

/// Entry of `/anime/{id}/recommendations` and `/manga/{id}/recommendations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub entry: RecommendationEntry,
    #[serde(default)]
    pub votes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub mal_id: u32,
    pub title: String,
    #[serde(default)]
    pub images: Images,
}

/// Entry of `/anime/{id}/reviews` and `/manga/{id}/reviews`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub mal_id: u32,
    pub user: ReviewUser,
    pub date: Option<String>,
    #[serde(default)]
    pub review: String,
    pub score: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_spoiler: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewUser {
    pub username: String,
}

/// Error body returned by Jikan alongside non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: serde_json::Value,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn names(entities: &[MalEntity]) -> Vec<String> {
    entities.iter().map(|e| e.name.clone()).collect()
}

impl From<&AnimeEntry> for AnimeSummary {
    fn from(entry: &AnimeEntry) -> Self {
        AnimeSummary {
            mal_id: entry.mal_id,
            title: entry.title.clone(),
            title_english: entry.title_english.clone(),
            anime_type: entry.anime_type.clone(),
            episodes: entry.episodes,
            status: entry.status.clone(),
            airing: entry.airing,
            score: entry.score,
            rank: entry.rank,
            year: entry
                .year
                .or_else(|| entry.aired.as_ref().and_then(DateRange::start_year)),
            image_url: entry.images.best_url(),
        }
    }
}

impl From<AnimeEntry> for AnimeSummary {
    fn from(entry: AnimeEntry) -> Self {
        AnimeSummary::from(&entry)
    }
}

impl From<AnimeEntry> for AnimeDetail {
    fn from(entry: AnimeEntry) -> Self {
        AnimeDetail {
            summary: AnimeSummary::from(&entry),
            title_japanese: entry.title_japanese,
            source: entry.source,
            duration: entry.duration,
            rating: entry.rating,
            season: entry.season,
            scored_by: entry.scored_by,
            popularity: entry.popularity,
            members: entry.members,
            synopsis: entry.synopsis,
            genres: names(&entry.genres),
            themes: names(&entry.themes),
            studios: names(&entry.studios),
            trailer_url: entry.trailer.and_then(|t| t.url),
            broadcast: entry.broadcast.and_then(|b| b.string),
        }
    }
}

impl From<&MangaEntry> for MangaSummary {
    fn from(entry: &MangaEntry) -> Self {
        MangaSummary {
            mal_id: entry.mal_id,
            title: entry.title.clone(),
            title_english: entry.title_english.clone(),
            manga_type: entry.manga_type.clone(),
            chapters: entry.chapters,
            volumes: entry.volumes,
            status: entry.status.clone(),
            publishing: entry.publishing,
            score: entry.score,
            rank: entry.rank,
            year: entry.published.as_ref().and_then(DateRange::start_year),
            image_url: entry.images.best_url(),
        }
    }
}

impl From<MangaEntry> for MangaSummary {
    fn from(entry: MangaEntry) -> Self {
        MangaSummary::from(&entry)
    }
}

impl From<MangaEntry> for MangaDetail {
    fn from(entry: MangaEntry) -> Self {
        MangaDetail {
            summary: MangaSummary::from(&entry),
            title_japanese: entry.title_japanese,
            scored_by: entry.scored_by,
            popularity: entry.popularity,
            members: entry.members,
            synopsis: entry.synopsis,
            genres: names(&entry.genres),
            themes: names(&entry.themes),
            authors: names(&entry.authors),
            serializations: names(&entry.serializations),
        }
    }
}

/// "October 3, 2002" from an RFC 3339 timestamp; anything else is kept as is
pub fn display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

impl From<CharacterItem> for CharacterRole {
    fn from(item: CharacterItem) -> Self {
        let mut actors = item.voice_actors;
        // Stable sort keeps the API order within each group
        actors.sort_by_key(|actor| actor.language != "Japanese");
        CharacterRole {
            mal_id: item.character.mal_id,
            name: item.character.name,
            role: item.role,
            image_url: item.character.images.best_url(),
            voice_actors: actors
                .into_iter()
                .map(|actor| format!("{} ({})", actor.person.name, actor.language))
                .collect(),
        }
    }
}

impl From<EpisodeItem> for Episode {
    fn from(item: EpisodeItem) -> Self {
        Episode {
            number: item.mal_id,
            title: item.title,
            aired: item.aired.as_deref().map(display_date),
            score: item.score,
            filler: item.filler,
            recap: item.recap,
        }
    }
}

impl From<RecommendationItem> for AnimeSummary {
    fn from(item: RecommendationItem) -> Self {
        let image_url = item.entry.images.best_url();
        AnimeSummary::linked(item.entry.mal_id, item.entry.title, image_url)
    }
}

impl From<RecommendationItem> for MangaSummary {
    fn from(item: RecommendationItem) -> Self {
        let image_url = item.entry.images.best_url();
        MangaSummary::linked(item.entry.mal_id, item.entry.title, image_url)
    }
}

impl From<ReviewItem> for Review {
    fn from(item: ReviewItem) -> Self {
        Review {
            mal_id: item.mal_id,
            username: item.user.username,
            score: item.score,
            date: item.date.as_deref().map(display_date),
            text: item.review,
            tags: item.tags,
            is_spoiler: item.is_spoiler,
        }
    }
}

impl From<GenreItem> for Genre {
    fn from(item: GenreItem) -> Self {
        Genre {
            mal_id: item.mal_id,
            name: item.name,
            count: item.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIME_PAGE: &str = r#"{
        "pagination": {
            "last_visible_page": 40,
            "has_next_page": true,
            "current_page": 1,
            "items": { "count": 2, "total": 1000, "per_page": 2 }
        },
        "data": [
            {
                "mal_id": 20,
                "url": "https://myanimelist.net/anime/20/Naruto",
                "images": {
                    "jpg": { "image_url": "a.jpg", "small_image_url": null, "large_image_url": "a_l.jpg" },
                    "webp": { "image_url": "a.webp", "small_image_url": null, "large_image_url": null }
                },
                "title": "Naruto",
                "title_english": "Naruto",
                "title_japanese": "ナルト",
                "type": "TV",
                "source": "Manga",
                "episodes": 220,
                "status": "Finished Airing",
                "airing": false,
                "aired": { "from": "2002-10-03T00:00:00+00:00", "to": "2007-02-08T00:00:00+00:00", "string": "Oct 3, 2002 to Feb 8, 2007" },
                "duration": "23 min per ep",
                "rating": "PG-13 - Teens 13 or older",
                "score": 8.0,
                "scored_by": 2000000,
                "rank": 600,
                "popularity": 10,
                "members": 3000000,
                "synopsis": "Ninja.",
                "season": null,
                "year": null,
                "studios": [{ "mal_id": 1, "type": "anime", "name": "Pierrot", "url": "" }],
                "genres": [{ "mal_id": 1, "type": "anime", "name": "Action", "url": "" }]
            },
            {
                "mal_id": 21,
                "title": "One Piece",
                "title_english": null,
                "title_japanese": null,
                "type": "TV",
                "source": null,
                "episodes": null,
                "status": "Currently Airing",
                "airing": true,
                "duration": null,
                "rating": null,
                "score": null,
                "scored_by": null,
                "rank": null,
                "popularity": null,
                "members": null,
                "synopsis": null,
                "season": "fall",
                "year": 1999
            }
        ]
    }"#;

    #[test]
    fn test_parse_anime_page() {
        let page: PaginatedResponse<AnimeEntry> = serde_json::from_str(ANIME_PAGE).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.has_next_page(), Some(true));
        assert_eq!(page.total(), Some(1000));
    }

    #[test]
    fn test_anime_summary_conversion() {
        let page: PaginatedResponse<AnimeEntry> = serde_json::from_str(ANIME_PAGE).unwrap();
        let summaries = page.map_data(AnimeSummary::from);

        let naruto = &summaries.data[0];
        assert_eq!(naruto.mal_id, 20);
        assert_eq!(naruto.year, Some(2002));
        assert_eq!(naruto.image_url.as_deref(), Some("a.webp"));

        let one_piece = &summaries.data[1];
        assert_eq!(one_piece.year, Some(1999));
        assert_eq!(one_piece.image_url, None);
        assert!(one_piece.airing);
    }

    #[test]
    fn test_anime_detail_conversion() {
        let page: PaginatedResponse<AnimeEntry> = serde_json::from_str(ANIME_PAGE).unwrap();
        let detail = AnimeDetail::from(page.data[0].clone());
        assert_eq!(detail.studios, vec!["Pierrot".to_string()]);
        assert_eq!(detail.genres, vec!["Action".to_string()]);
        assert_eq!(detail.summary.title, "Naruto");
    }

    #[test]
    fn test_manga_summary_year_from_published() {
        let json = r#"{
            "mal_id": 2,
            "title": "Berserk",
            "title_english": "Berserk",
            "title_japanese": null,
            "type": "Manga",
            "chapters": null,
            "volumes": null,
            "status": "Publishing",
            "publishing": true,
            "published": { "from": "1989-08-25T00:00:00+00:00", "to": null },
            "score": 9.47,
            "scored_by": 1,
            "rank": 1,
            "popularity": 1,
            "members": 1,
            "synopsis": null,
            "authors": [{ "mal_id": 1868, "type": "people", "name": "Miura, Kentarou", "url": "" }]
        }"#;

        let entry: MangaEntry = serde_json::from_str(json).unwrap();
        let detail = MangaDetail::from(entry);
        assert_eq!(detail.summary.year, Some(1989));
        assert_eq!(detail.authors, vec!["Miura, Kentarou".to_string()]);
        assert!(detail.summary.publishing);
    }

    #[test]
    fn test_character_conversion_puts_japanese_first() {
        let json = r#"{
            "data": [{
                "character": {
                    "mal_id": 417,
                    "name": "Lamperouge, Lelouch",
                    "images": { "jpg": { "image_url": "l.jpg" } }
                },
                "role": "Main",
                "voice_actors": [
                    { "person": { "mal_id": 1, "name": "Green, Johnny Yong", "url": "" }, "language": "English" },
                    { "person": { "mal_id": 2, "name": "Fukuyama, Jun", "url": "" }, "language": "Japanese" }
                ]
            }]
        }"#;

        let page: DataResponse<CharacterItem> = serde_json::from_str(json).unwrap();
        let role = CharacterRole::from(page.data[0].clone());
        assert_eq!(role.name, "Lamperouge, Lelouch");
        assert_eq!(role.role, "Main");
        assert_eq!(role.image_url.as_deref(), Some("l.jpg"));
        assert_eq!(role.voice_actors[0], "Fukuyama, Jun (Japanese)");
    }

    #[test]
    fn test_episode_and_review_dates() {
        let episode: EpisodeItem = serde_json::from_str(
            r#"{ "mal_id": 1, "title": "Jiyuu", "aired": "2002-10-03T00:00:00+00:00", "score": 4.5, "filler": false, "recap": false }"#,
        )
        .unwrap();
        let episode = Episode::from(episode);
        assert_eq!(episode.number, 1);
        assert_eq!(episode.aired.as_deref(), Some("October 3, 2002"));

        let review: ReviewItem = serde_json::from_str(
            r#"{ "mal_id": 9, "user": { "username": "reader" }, "date": "not a date", "review": "Great.", "score": 9, "tags": ["Recommended"] }"#,
        )
        .unwrap();
        let review = Review::from(review);
        assert_eq!(review.date.as_deref(), Some("not a date"));
        assert_eq!(review.tags, vec!["Recommended".to_string()]);
        assert!(!review.is_spoiler);
    }

    #[test]
    fn test_recommendation_becomes_linked_summary() {
        let item: RecommendationItem = serde_json::from_str(
            r#"{ "entry": { "mal_id": 1535, "title": "Death Note", "images": { "webp": { "image_url": "d.webp" } } }, "votes": 120 }"#,
        )
        .unwrap();
        let summary = AnimeSummary::from(item);
        assert_eq!(summary.mal_id, 1535);
        assert_eq!(summary.image_url.as_deref(), Some("d.webp"));
        assert_eq!(summary.score, None);
    }

    #[test]
    fn test_missing_pagination_is_unknown() {
        let page: PaginatedResponse<GenreItem> =
            serde_json::from_str(r#"{ "data": [{ "mal_id": 1, "name": "Action", "count": 5000 }] }"#).unwrap();
        assert_eq!(page.has_next_page(), None);
        assert_eq!(page.total(), None);
    }
}
