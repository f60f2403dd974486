//! Jikan API client with rate limiting, retry logic and memoization.

use super::error::{JikanError, JikanResult};
use super::params::{clamp_limit, SearchParams, TopAnimeFilter, TopMangaFilter};
use super::rate_limiter::RateLimiter;
use super::types::*;
use crate::cache::{Freshness, QueryCache};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::config::ApiConfig;
use shared::filters::encode_query;
use shared::{
    AnimeDetail, AnimeSummary, CharacterRole, Episode, Genre, MangaDetail, MangaSummary, MediaKind,
    Review,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How a request interacts with the query cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caching {
    /// Always hit the network (random picks)
    Bypass,
    /// Memoize with the cache's default stale time
    Stale,
    /// Memoize for the whole session
    Forever,
}

/// Jikan API v4 client
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API
    base_url: String,
    /// Rate limiter shared by every request made through this client
    rate_limiter: Mutex<RateLimiter>,
    /// Response memoization
    cache: Arc<QueryCache>,
    /// Maximum retries for failed requests
    max_retries: u32,
    /// Base delay for retry (exponential backoff)
    retry_delay_ms: u64,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(config: &ApiConfig, cache: Arc<QueryCache>) -> JikanResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Mutex::new(RateLimiter::new(
                config.rate_limit.requests_per_second,
                config.rate_limit.requests_per_minute,
            )),
            cache,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// The cache this client memoizes into
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }

    /// Cache key for an endpoint and its query
    fn cache_key(endpoint: &str, query: &[(&'static str, String)]) -> String {
        if query.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, encode_query(query))
        }
    }

    /// Make a GET request with memoization, rate limiting and retry logic
    async fn get<T>(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
        caching: Caching,
    ) -> JikanResult<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let key = Self::cache_key(endpoint, query);

        if caching != Caching::Bypass {
            if let Some(cached) = self.cache.get::<T>(&key) {
                return Ok(cached);
            }
        }

        let data: T = self.fetch(endpoint, query).await?;

        match caching {
            Caching::Bypass => {}
            Caching::Stale => self.cache.set(&key, &data),
            Caching::Forever => self.cache.set_with(&key, &data, Freshness::Forever),
        }

        Ok(data)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
    ) -> JikanResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut last_error = String::from("no attempt made");

        for attempt in 0..=self.max_retries {
            self.rate_limiter.lock().await.acquire().await;

            debug!(url = %url, attempt = attempt + 1, "Making API request");

            match self.client.get(&url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response.bytes().await?;
                        return serde_json::from_slice::<T>(&body).map_err(|e| {
                            warn!(url = %url, error = %e, "Failed to parse response");
                            JikanError::Decode(e)
                        });
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt == self.max_retries {
                            return Err(JikanError::RateLimited {
                                attempts: attempt + 1,
                            });
                        }
                        let delay = self.backoff(attempt);
                        warn!(
                            url = %url,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited by server, waiting"
                        );
                        sleep(delay).await;
                        continue;
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    let message = serde_json::from_str::<ErrorBody>(&body)
                        .ok()
                        .and_then(|b| b.message)
                        .unwrap_or(body);

                    warn!(url = %url, status = %status, error = %message, "Request failed");

                    let error = JikanError::Status {
                        status,
                        body: message,
                    };
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = error.to_string();
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Request error");
                    let error = JikanError::Http(e);
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = error.to_string();
                }
            }

            if attempt < self.max_retries {
                let delay = self.backoff(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(JikanError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last: last_error,
        })
    }

    /// Search anime by title and filters
    pub async fn search_anime(
        &self,
        params: &SearchParams,
    ) -> JikanResult<PaginatedResponse<AnimeSummary>> {
        debug!(query = %params.query, page = params.page, "Searching anime");
        let params = SearchParams {
            kind: MediaKind::Anime,
            ..params.clone()
        };
        let response: PaginatedResponse<AnimeEntry> =
            self.get("/anime", &params.to_query(), Caching::Stale).await?;
        Ok(response.map_data(AnimeSummary::from))
    }

    /// Search manga by title and filters
    pub async fn search_manga(
        &self,
        params: &SearchParams,
    ) -> JikanResult<PaginatedResponse<MangaSummary>> {
        debug!(query = %params.query, page = params.page, "Searching manga");
        let params = SearchParams {
            kind: MediaKind::Manga,
            ..params.clone()
        };
        let response: PaginatedResponse<MangaEntry> =
            self.get("/manga", &params.to_query(), Caching::Stale).await?;
        Ok(response.map_data(MangaSummary::from))
    }

    /// Fetch a page of the top anime ranking
    pub async fn top_anime(
        &self,
        page: u32,
        limit: u32,
        filter: Option<TopAnimeFilter>,
    ) -> JikanResult<PaginatedResponse<AnimeSummary>> {
        info!(page = page, filter = ?filter, "Fetching top anime");
        let mut query = vec![
            ("page", page.max(1).to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("filter", filter.as_str().to_string()));
        }
        let response: PaginatedResponse<AnimeEntry> =
            self.get("/top/anime", &query, Caching::Stale).await?;
        Ok(response.map_data(AnimeSummary::from))
    }

    /// Fetch a page of the top manga ranking
    pub async fn top_manga(
        &self,
        page: u32,
        limit: u32,
        filter: Option<TopMangaFilter>,
    ) -> JikanResult<PaginatedResponse<MangaSummary>> {
        info!(page = page, filter = ?filter, "Fetching top manga");
        let mut query = vec![
            ("page", page.max(1).to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("filter", filter.as_str().to_string()));
        }
        let response: PaginatedResponse<MangaEntry> =
            self.get("/top/manga", &query, Caching::Stale).await?;
        Ok(response.map_data(MangaSummary::from))
    }

    /// Fetch a page of the current season
    pub async fn season_now(
        &self,
        page: u32,
        limit: u32,
    ) -> JikanResult<PaginatedResponse<AnimeSummary>> {
        info!(page = page, "Fetching current season");
        let query = vec![
            ("page", page.max(1).to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        let response: PaginatedResponse<AnimeEntry> =
            self.get("/seasons/now", &query, Caching::Stale).await?;
        Ok(response.map_data(AnimeSummary::from))
    }

    /// Fetch the broadcast schedule
    pub async fn schedules(&self, limit: u32) -> JikanResult<PaginatedResponse<AnimeSummary>> {
        info!(limit = limit, "Fetching schedules");
        let query = vec![
            ("limit", clamp_limit(limit).to_string()),
            ("sfw", "true".to_string()),
            ("kids", "false".to_string()),
            ("unapproved", "false".to_string()),
        ];
        let response: PaginatedResponse<AnimeEntry> =
            self.get("/schedules", &query, Caching::Forever).await?;
        Ok(response.map_data(AnimeSummary::from))
    }

    /// Fetch full anime details by MAL ID
    pub async fn anime_by_id(&self, mal_id: u32) -> JikanResult<AnimeDetail> {
        debug!(mal_id = mal_id, "Fetching anime details");
        let response: ItemResponse<AnimeEntry> = self
            .get(&format!("/anime/{}/full", mal_id), &[], Caching::Forever)
            .await?;
        Ok(AnimeDetail::from(response.data))
    }

    /// Fetch full manga details by MAL ID
    pub async fn manga_by_id(&self, mal_id: u32) -> JikanResult<MangaDetail> {
        debug!(mal_id = mal_id, "Fetching manga details");
        let response: ItemResponse<MangaEntry> = self
            .get(&format!("/manga/{}/full", mal_id), &[], Caching::Forever)
            .await?;
        Ok(MangaDetail::from(response.data))
    }

    /// Characters of an anime or manga
    pub async fn characters(&self, kind: MediaKind, mal_id: u32) -> JikanResult<Vec<CharacterRole>> {
        debug!(kind = %kind, mal_id = mal_id, "Fetching characters");
        let response: DataResponse<CharacterItem> = self
            .get(&format!("/{}/{}/characters", kind, mal_id), &[], Caching::Forever)
            .await?;
        Ok(response.data.into_iter().map(CharacterRole::from).collect())
    }

    /// One page of an anime's episode list
    pub async fn anime_episodes(
        &self,
        mal_id: u32,
        page: u32,
    ) -> JikanResult<PaginatedResponse<Episode>> {
        debug!(mal_id = mal_id, page = page, "Fetching episodes");
        let query = vec![("page", page.max(1).to_string())];
        let response: PaginatedResponse<EpisodeItem> = self
            .get(&format!("/anime/{}/episodes", mal_id), &query, Caching::Stale)
            .await?;
        Ok(response.map_data(Episode::from))
    }

    /// Entries users recommend alongside this one
    pub async fn recommendations<T>(&self, kind: MediaKind, mal_id: u32) -> JikanResult<Vec<T>>
    where
        T: From<RecommendationItem>,
    {
        debug!(kind = %kind, mal_id = mal_id, "Fetching recommendations");
        let response: DataResponse<RecommendationItem> = self
            .get(&format!("/{}/{}/recommendations", kind, mal_id), &[], Caching::Stale)
            .await?;
        Ok(response.data.into_iter().map(T::from).collect())
    }

    /// First page of user reviews
    pub async fn reviews(&self, kind: MediaKind, mal_id: u32) -> JikanResult<Vec<Review>> {
        debug!(kind = %kind, mal_id = mal_id, "Fetching reviews");
        let response: PaginatedResponse<ReviewItem> = self
            .get(&format!("/{}/{}/reviews", kind, mal_id), &[], Caching::Stale)
            .await?;
        Ok(response.data.into_iter().map(Review::from).collect())
    }

    /// Pick a random anime (never memoized)
    pub async fn random_anime(&self) -> JikanResult<AnimeDetail> {
        info!("Fetching random anime");
        let response: ItemResponse<AnimeEntry> =
            self.get("/random/anime", &[], Caching::Bypass).await?;
        Ok(AnimeDetail::from(response.data))
    }

    /// Fetch all anime genres
    pub async fn anime_genres(&self) -> JikanResult<Vec<Genre>> {
        info!("Fetching anime genres");
        let response: DataResponse<GenreItem> =
            self.get("/genres/anime", &[], Caching::Forever).await?;
        Ok(response.data.into_iter().map(Genre::from).collect())
    }

    /// Requests made through this client in the last minute
    pub async fn rate_limit_usage(&self) -> usize {
        self.rate_limiter.lock().await.current_minute_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TOP_PAGE: &str = r#"{"pagination":{"last_visible_page":2,"has_next_page":true,"current_page":1,"items":{"count":1,"total":2,"per_page":1}},"data":[{"mal_id":5114,"title":"Fullmetal Alchemist: Brotherhood","title_english":null,"title_japanese":null,"type":"TV","source":null,"episodes":64,"status":"Finished Airing","airing":false,"duration":null,"rating":null,"score":9.1,"scored_by":null,"rank":1,"popularity":null,"members":null,"synopsis":null,"season":"spring","year":2009}]}"#;

    /// Serve canned responses on a local port, counting requests
    async fn serve(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn config(base_url: String) -> ApiConfig {
        ApiConfig {
            base_url,
            max_retries: 1,
            retry_delay_ms: 1,
            rate_limit: shared::config::RateLimitConfig {
                requests_per_second: 1000.0,
                requests_per_minute: 1000,
            },
            ..ApiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let cache = Arc::new(QueryCache::disabled());
        let client = JikanClient::new(&ApiConfig::default(), cache);
        assert!(client.is_ok());
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(JikanClient::cache_key("/genres/anime", &[]), "/genres/anime");
        assert_eq!(
            JikanClient::cache_key("/anime", &[("q", "one piece".to_string()), ("page", "2".to_string())]),
            "/anime?q=one%20piece&page=2"
        );
    }

    #[tokio::test]
    async fn test_top_anime_is_memoized() {
        let (base_url, hits) = serve("HTTP/1.1 200 OK", TOP_PAGE).await;
        let cache = Arc::new(QueryCache::new(true, Duration::from_secs(60), 16));
        let client = JikanClient::new(&config(base_url), cache).unwrap();

        let first = client.top_anime(1, 25, None).await.unwrap();
        assert_eq!(first.data[0].mal_id, 5114);
        assert_eq!(first.has_next_page(), Some(true));

        let second = client.top_anime(1, 25, None).await.unwrap();
        assert_eq!(second.data[0].title, first.data[0].title);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recommendations_for_either_kind() {
        let (base_url, _) = serve(
            "HTTP/1.1 200 OK",
            r#"{"data":[{"entry":{"mal_id":2,"title":"Berserk"},"votes":40}]}"#,
        )
        .await;
        let client = JikanClient::new(&config(base_url), Arc::new(QueryCache::disabled())).unwrap();

        let manga: Vec<MangaSummary> = client.recommendations(MediaKind::Manga, 1).await.unwrap();
        assert_eq!(manga[0].mal_id, 2);
        assert_eq!(manga[0].title, "Berserk");

        let anime: Vec<AnimeSummary> = client.recommendations(MediaKind::Anime, 1).await.unwrap();
        assert_eq!(anime[0].title, "Berserk");
    }

    #[tokio::test]
    async fn test_not_found_fails_fast() {
        let (base_url, hits) = serve(
            "HTTP/1.1 404 Not Found",
            r#"{"status":404,"type":"BadResponseException","message":"Resource does not exist"}"#,
        )
        .await;
        let client = JikanClient::new(&config(base_url), Arc::new(QueryCache::disabled())).unwrap();

        let err = client.anime_by_id(999_999).await.unwrap_err();
        match err {
            JikanError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "Resource does not exist");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let (base_url, hits) = serve("HTTP/1.1 503 Service Unavailable", "{}").await;
        let client = JikanClient::new(&config(base_url), Arc::new(QueryCache::disabled())).unwrap();

        let err = client.season_now(1, 25).await.unwrap_err();
        assert!(matches!(err, JikanError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
