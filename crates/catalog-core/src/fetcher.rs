//! Data sources the controllers are driven by.
//!
//! The controllers never talk to the remote API directly. They are handed a
//! page fetcher or a search source, which keeps them testable with fakes.

use crate::page::ResultPage;
use async_trait::async_trait;
use shared::FilterState;
use std::future::Future;
use std::sync::Arc;

/// Retrieves one page of a paginated collection
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<T>>;
}

/// A search request against the remote catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub filters: Option<FilterState>,
}

impl SearchRequest {
    /// First page of a plain title search
    pub fn preview(query: impl Into<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            page: 1,
            limit,
            filters: None,
        }
    }
}

/// Runs searches against the remote catalog
#[async_trait]
pub trait SearchSource<T>: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<ResultPage<T>>;
}

/// Page fetcher backed by a closure
pub struct FnFetcher<F>(F);

/// Wrap `Fn(page) -> Future` as a page fetcher
pub fn page_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher(f)
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for FnFetcher<F>
where
    T: Send + 'static,
    F: Fn(u32) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ResultPage<T>>> + Send,
{
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<T>> {
        (self.0)(page).await
    }
}

/// Search source backed by a closure
pub struct FnSearch<F>(F);

/// Wrap `Fn(request) -> Future` as a search source
pub fn search_fn<F>(f: F) -> FnSearch<F> {
    FnSearch(f)
}

#[async_trait]
impl<T, F, Fut> SearchSource<T> for FnSearch<F>
where
    T: Send + 'static,
    F: Fn(SearchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ResultPage<T>>> + Send,
{
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<ResultPage<T>> {
        (self.0)(request.clone()).await
    }
}

/// Pages through the results of one fixed query and filter set
pub struct SearchPages<T> {
    source: Arc<dyn SearchSource<T>>,
    query: String,
    filters: FilterState,
    limit: u32,
}

impl<T> SearchPages<T> {
    pub fn new(
        source: Arc<dyn SearchSource<T>>,
        query: impl Into<String>,
        filters: FilterState,
        limit: u32,
    ) -> Self {
        Self {
            source,
            query: query.into(),
            filters,
            limit,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> PageFetcher<T> for SearchPages<T> {
    async fn fetch_page(&self, page: u32) -> anyhow::Result<ResultPage<T>> {
        if self.query.trim().is_empty() {
            return Ok(ResultPage::empty());
        }

        let request = SearchRequest {
            query: self.query.clone(),
            page,
            limit: self.limit,
            filters: Some(self.filters.clone()),
        };
        self.source.search(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_page_fn() {
        let fetcher = page_fn(|page: u32| async move {
            Ok::<_, anyhow::Error>(ResultPage::new(page, vec![page * 10]).with_next(page < 2))
        });

        let page = fetcher.fetch_page(2).await.unwrap();
        assert_eq!(page.items, vec![20]);
        assert_eq!(page.has_next, Some(false));
    }

    #[tokio::test]
    async fn test_search_pages_forwards_filters() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let source: Arc<dyn SearchSource<u32>> = Arc::new(search_fn(move |req: SearchRequest| {
            log.lock().unwrap().push(req.clone());
            async move { Ok::<_, anyhow::Error>(ResultPage::new(req.page, vec![1u32])) }
        }));

        let mut filters = FilterState::default();
        filters.toggle_genre(4);
        let pages = SearchPages::new(source, "bebop", filters.clone(), 25);

        pages.fetch_page(3).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].page, 3);
        assert_eq!(seen[0].query, "bebop");
        assert_eq!(seen[0].filters.as_ref(), Some(&filters));
    }

    #[tokio::test]
    async fn test_search_pages_blank_query_is_empty() {
        let source: Arc<dyn SearchSource<u32>> = Arc::new(search_fn(|_req: SearchRequest| async {
            Err::<ResultPage<u32>, _>(anyhow::anyhow!("should not be called"))
        }));
        let pages = SearchPages::new(source, "   ", FilterState::default(), 25);

        let page = pages.fetch_page(1).await.unwrap();
        assert!(page.items.is_empty());
    }
}
