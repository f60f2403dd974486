//! Page fetchers and search sources backed by the Jikan client.

use anyhow::Context;
use async_trait::async_trait;
use catalog_core::{DetailSource, PageFetcher, RandomFallback, ResultPage, SearchRequest, SearchSource};
use jikan_client::api::types::PaginatedResponse;
use jikan_client::{JikanClient, SearchParams, TopAnimeFilter, TopMangaFilter};
use shared::{
    AnimeDetail, AnimeSummary, CharacterRole, Episode, MangaDetail, MangaSummary, MediaKind, Review,
};
use std::sync::Arc;

/// Convert an API page into the shape the controllers consume
pub fn to_page<T>(response: PaginatedResponse<T>, page: u32) -> ResultPage<T> {
    let has_next = response.has_next_page();
    let total = response.total();

    let mut result = ResultPage::new(page, response.data);
    result.has_next = has_next;
    result.total_count = total;
    result
}

fn search_params(kind: MediaKind, request: &SearchRequest) -> SearchParams {
    let mut params = SearchParams::new(kind, request.query.clone())
        .page(request.page)
        .limit(request.limit);
    if let Some(filters) = &request.filters {
        params = params.filters(filters.clone());
    }
    params
}

pub struct AnimeSearch {
    client: Arc<JikanClient>,
}

impl AnimeSearch {
    pub fn new(client: Arc<JikanClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchSource<AnimeSummary> for AnimeSearch {
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<ResultPage<AnimeSummary>> {
        let params = search_params(MediaKind::Anime, request);
        let response = self
            .client
            .search_anime(&params)
            .await
            .with_context(|| format!("Anime search for {:?} failed", request.query))?;
        Ok(to_page(response, request.page))
    }
}

pub struct MangaSearch {
    client: Arc<JikanClient>,
}

impl MangaSearch {
    pub fn new(client: Arc<JikanClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchSource<MangaSummary> for MangaSearch {
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<ResultPage<MangaSummary>> {
        let params = search_params(MediaKind::Manga, request);
        let response = self
            .client
            .search_manga(&params)
            .await
            .with_context(|| format!("Manga search for {:?} failed", request.query))?;
        Ok(to_page(response, request.page))
    }
}

/// Pages of the top anime ranking
pub struct TopAnimePages {
    pub client: Arc<JikanClient>,
    pub filter: Option<TopAnimeFilter>,
    pub limit: u32,
}

#[async_trait]
impl PageFetcher<AnimeSummary> for TopAnimePages {
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<AnimeSummary>> {
        let response = self
            .client
            .top_anime(page, self.limit, self.filter)
            .await
            .with_context(|| format!("Top anime page {} failed", page))?;
        Ok(to_page(response, page))
    }
}

/// Pages of the top manga ranking
pub struct TopMangaPages {
    pub client: Arc<JikanClient>,
    pub filter: Option<TopMangaFilter>,
    pub limit: u32,
}

#[async_trait]
impl PageFetcher<MangaSummary> for TopMangaPages {
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<MangaSummary>> {
        let response = self
            .client
            .top_manga(page, self.limit, self.filter)
            .await
            .with_context(|| format!("Top manga page {} failed", page))?;
        Ok(to_page(response, page))
    }
}

/// Pages of the current season
pub struct SeasonPages {
    pub client: Arc<JikanClient>,
    pub limit: u32,
}

#[async_trait]
impl PageFetcher<AnimeSummary> for SeasonPages {
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<AnimeSummary>> {
        let response = self
            .client
            .season_now(page, self.limit)
            .await
            .with_context(|| format!("Seasonal anime page {} failed", page))?;
        Ok(to_page(response, page))
    }
}

/// Parts of an anime detail page
pub struct AnimeDetails {
    pub client: Arc<JikanClient>,
}

#[async_trait]
impl DetailSource for AnimeDetails {
    type Detail = AnimeDetail;
    type Related = AnimeSummary;

    async fn detail(&self, id: u32) -> anyhow::Result<AnimeDetail> {
        self.client
            .anime_by_id(id)
            .await
            .with_context(|| format!("Failed to load anime {}", id))
    }

    async fn characters(&self, id: u32) -> anyhow::Result<Vec<CharacterRole>> {
        Ok(self.client.characters(MediaKind::Anime, id).await?)
    }

    async fn episodes(&self, id: u32) -> Option<anyhow::Result<Vec<Episode>>> {
        let page = self.client.anime_episodes(id, 1).await;
        Some(page.map(|page| page.data).map_err(anyhow::Error::from))
    }

    async fn recommendations(&self, id: u32) -> anyhow::Result<Vec<AnimeSummary>> {
        Ok(self.client.recommendations(MediaKind::Anime, id).await?)
    }

    async fn reviews(&self, id: u32) -> anyhow::Result<Vec<Review>> {
        Ok(self.client.reviews(MediaKind::Anime, id).await?)
    }
}

/// Parts of a manga detail page (manga have no episode list)
pub struct MangaDetails {
    pub client: Arc<JikanClient>,
}

#[async_trait]
impl DetailSource for MangaDetails {
    type Detail = MangaDetail;
    type Related = MangaSummary;

    async fn detail(&self, id: u32) -> anyhow::Result<MangaDetail> {
        self.client
            .manga_by_id(id)
            .await
            .with_context(|| format!("Failed to load manga {}", id))
    }

    async fn characters(&self, id: u32) -> anyhow::Result<Vec<CharacterRole>> {
        Ok(self.client.characters(MediaKind::Manga, id).await?)
    }

    async fn episodes(&self, _id: u32) -> Option<anyhow::Result<Vec<Episode>>> {
        None
    }

    async fn recommendations(&self, id: u32) -> anyhow::Result<Vec<MangaSummary>> {
        Ok(self.client.recommendations(MediaKind::Manga, id).await?)
    }

    async fn reviews(&self, id: u32) -> anyhow::Result<Vec<Review>> {
        Ok(self.client.reviews(MediaKind::Manga, id).await?)
    }
}

/// The API's own random anime
pub struct RandomAnime {
    pub client: Arc<JikanClient>,
}

#[async_trait]
impl RandomFallback<AnimeSummary> for RandomAnime {
    async fn random(&self) -> anyhow::Result<AnimeSummary> {
        let detail = self
            .client
            .random_anime()
            .await
            .context("Random anime request failed")?;
        Ok(detail.summary)
    }
}
