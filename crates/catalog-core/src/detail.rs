//! Detail pages.
//!
//! The main record decides whether there is a page at all. Once it is in,
//! characters, episodes, recommendations and reviews load side by side and
//! each section succeeds or fails on its own.

use crate::error::{ControllerError, SECTION_FAILED};
use crate::grid::{GridOptions, GridVariant};
use crate::list::IncrementalResultList;
use async_trait::async_trait;
use shared::{CharacterRole, Episode, Review};
use tracing::{debug, warn};

/// Characters shown on a detail page
pub const CHARACTER_LIMIT: usize = 12;

/// Reviews shown on a detail page
pub const REVIEW_LIMIT: usize = 5;

/// Recommendations shown on a detail page
pub const RECOMMENDATION_LIMIT: usize = 6;

/// One independently loaded part of a detail page
#[derive(Debug, Clone)]
pub enum Section<T> {
    Loaded(T),
    Failed(ControllerError),
}

impl<T> Section<T> {
    fn settle(name: &str, id: u32, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Section::Loaded(value),
            Err(e) => {
                warn!(section = name, mal_id = id, error = %format!("{:#}", e), "Section failed to load");
                Section::Failed(ControllerError::new(SECTION_FAILED, e))
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Section::Loaded(value) => Some(value),
            Section::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ControllerError> {
        match self {
            Section::Loaded(_) => None,
            Section::Failed(e) => Some(e),
        }
    }
}

/// Where a detail page gets its parts from
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// The main record
    type Detail: Send;
    /// Summary type of recommended entries
    type Related: Send;

    async fn detail(&self, id: u32) -> anyhow::Result<Self::Detail>;

    async fn characters(&self, id: u32) -> anyhow::Result<Vec<CharacterRole>>;

    /// `None` for kinds without an episode list
    async fn episodes(&self, id: u32) -> Option<anyhow::Result<Vec<Episode>>>;

    async fn recommendations(&self, id: u32) -> anyhow::Result<Vec<Self::Related>>;

    async fn reviews(&self, id: u32) -> anyhow::Result<Vec<Review>>;
}

/// A loaded detail page
#[derive(Debug, Clone)]
pub struct DetailPage<D, R> {
    pub detail: D,
    pub characters: Section<Vec<CharacterRole>>,
    pub episodes: Option<Section<Vec<Episode>>>,
    pub recommendations: Section<IncrementalResultList<R>>,
    pub reviews: Section<Vec<Review>>,
}

/// Grid used for the recommendations strip
pub fn recommendation_grid() -> GridOptions {
    GridOptions {
        limit: Some(RECOMMENDATION_LIMIT),
        show_load_more: false,
        show_stats: false,
        ..GridOptions::variant(GridVariant::Minimalist)
    }
}

fn first<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// Load a detail page. Only a failure of the main record fails the page.
pub async fn load<S: DetailSource>(
    source: &S,
    id: u32,
) -> anyhow::Result<DetailPage<S::Detail, S::Related>> {
    let detail = source.detail(id).await?;

    debug!(mal_id = id, "Loading detail sections");
    let (characters, episodes, recommendations, reviews) = tokio::join!(
        source.characters(id),
        source.episodes(id),
        source.recommendations(id),
        source.reviews(id),
    );

    let grid = recommendation_grid().resolve();
    Ok(DetailPage {
        detail,
        characters: Section::settle(
            "characters",
            id,
            characters.map(|c| first(c, CHARACTER_LIMIT)),
        ),
        episodes: episodes.map(|result| Section::settle("episodes", id, result)),
        recommendations: Section::settle(
            "recommendations",
            id,
            recommendations.map(|items| IncrementalResultList::from_items(items, grid)),
        ),
        reviews: Section::settle("reviews", id, reviews.map(|r| first(r, REVIEW_LIMIT))),
    })
}
