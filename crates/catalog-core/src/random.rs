//! Random discovery.
//!
//! A pick is one result drawn from a random page of a score-ordered search
//! narrowed by the user's preferences. When that finds nothing, or fails, the
//! picker falls back to the API's own random entry. Every pick lands at the
//! front of a short history.

use crate::fetcher::{SearchRequest, SearchSource};
use crate::grid::{GridOptions, GridVariant};
use crate::list::IncrementalResultList;
use async_trait::async_trait;
use shared::{FilterState, SortDirection};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Picks remembered, newest first
pub const HISTORY_LIMIT: usize = 10;

/// Pages of the score-ordered search a pick is drawn from
pub const RANDOM_PAGES: u32 = 50;

/// What the user wants the pick narrowed to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomPreferences {
    pub media_type: Option<String>,
    pub genre: Option<u32>,
    pub status: Option<String>,
    /// `None` or zero means any score
    pub min_score: Option<f64>,
}

impl RandomPreferences {
    pub fn filters(&self) -> FilterState {
        FilterState {
            media_type: self.media_type.clone(),
            status: self.status.clone(),
            genres: self.genre.into_iter().collect(),
            min_score: self.min_score.filter(|s| *s > 0.0),
            order_by: "score".to_string(),
            sort: SortDirection::Desc,
            ..FilterState::default()
        }
    }

    /// One-result search on `page`, kept within the first `RANDOM_PAGES`
    pub fn request(&self, page: u32) -> SearchRequest {
        SearchRequest {
            query: String::new(),
            page: page.clamp(1, RANDOM_PAGES),
            limit: 1,
            filters: Some(self.filters()),
        }
    }
}

/// The API's unfiltered random pick
#[async_trait]
pub trait RandomFallback<T>: Send + Sync {
    async fn random(&self) -> anyhow::Result<T>;
}

/// Grid the history is shown in
pub fn history_grid() -> GridOptions {
    GridOptions {
        limit: Some(HISTORY_LIMIT),
        show_load_more: false,
        ..GridOptions::variant(GridVariant::Minimalist)
    }
}

pub struct RandomPicker<T> {
    source: Arc<dyn SearchSource<T>>,
    fallback: Arc<dyn RandomFallback<T>>,
    preferences: RandomPreferences,
    history: IncrementalResultList<T>,
}

impl<T: Clone + Send + 'static> RandomPicker<T> {
    pub fn new(
        source: Arc<dyn SearchSource<T>>,
        fallback: Arc<dyn RandomFallback<T>>,
        preferences: RandomPreferences,
    ) -> Self {
        Self {
            source,
            fallback,
            preferences,
            history: IncrementalResultList::from_items(Vec::new(), history_grid().resolve()),
        }
    }

    pub fn preferences(&self) -> &RandomPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: RandomPreferences) {
        self.preferences = preferences;
    }

    /// Draw one entry. `page` selects the search page and `choose` an index
    /// below the number of results it returned.
    pub async fn roll<F>(&mut self, page: u32, choose: F) -> anyhow::Result<T>
    where
        F: FnOnce(usize) -> usize,
    {
        let request = self.preferences.request(page);
        info!(page = request.page, "Rolling a random pick");

        let drawn = match self.source.search(&request).await {
            Ok(result) if !result.items.is_empty() => {
                let mut items = result.items;
                let index = choose(items.len()).min(items.len() - 1);
                Some(items.swap_remove(index))
            }
            Ok(_) => {
                debug!(page = request.page, "Nothing matched, using the random endpoint");
                None
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Filtered pick failed, using the random endpoint");
                None
            }
        };

        let pick = match drawn {
            Some(pick) => pick,
            None => self.fallback.random().await?,
        };
        self.remember(pick.clone());
        Ok(pick)
    }

    fn remember(&mut self, pick: T) {
        let mut items = Vec::with_capacity(HISTORY_LIMIT);
        items.push(pick);
        items.extend(self.history.items().iter().take(HISTORY_LIMIT - 1).cloned());
        self.history.set_items(items);
    }

    /// Earlier picks, newest first
    pub fn history(&self) -> &IncrementalResultList<T> {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::search_fn;
    use crate::page::ResultPage;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Fallback {
        next: AtomicU32,
    }

    #[async_trait]
    impl RandomFallback<u32> for Fallback {
        async fn random(&self) -> anyhow::Result<u32> {
            Ok(self.next.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn fallback(start: u32) -> Arc<dyn RandomFallback<u32>> {
        Arc::new(Fallback {
            next: AtomicU32::new(start),
        })
    }

    #[test]
    fn test_preferences_to_request() {
        let preferences = RandomPreferences {
            media_type: Some("movie".to_string()),
            genre: Some(22),
            status: None,
            min_score: Some(0.0),
        };

        let request = preferences.request(75);
        assert_eq!(request.page, RANDOM_PAGES);
        assert_eq!(request.limit, 1);
        assert!(request.query.is_empty());

        let filters = request.filters.unwrap();
        assert_eq!(filters.media_type.as_deref(), Some("movie"));
        assert_eq!(filters.genres, vec![22]);
        assert_eq!(filters.min_score, None);
        assert_eq!(filters.order_by, "score");
        assert_eq!(preferences.request(0).page, 1);
    }

    #[tokio::test]
    async fn test_roll_draws_from_search() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let source: Arc<dyn SearchSource<u32>> = Arc::new(search_fn(move |request: SearchRequest| {
            log.lock().unwrap().push(request.page);
            async move {
                Ok::<_, anyhow::Error>(ResultPage::new(
                    request.page,
                    vec![request.page * 100, request.page * 100 + 1],
                ))
            }
        }));
        let mut picker = RandomPicker::new(source, fallback(1), RandomPreferences::default());

        assert_eq!(picker.roll(7, |n| n - 1).await.unwrap(), 701);
        assert_eq!(picker.roll(3, |_| 99).await.unwrap(), 301);
        assert_eq!(*seen.lock().unwrap(), vec![7, 3]);
        assert_eq!(picker.history().items(), &[301, 701]);
    }

    #[tokio::test]
    async fn test_falls_back_when_search_is_empty_or_fails() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let source: Arc<dyn SearchSource<u32>> = Arc::new(search_fn(move |_request: SearchRequest| {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Ok::<ResultPage<u32>, anyhow::Error>(ResultPage::new(1, Vec::new()))
                } else {
                    Err(anyhow!("HTTP 500"))
                }
            }
        }));
        let mut picker = RandomPicker::new(source, fallback(40), RandomPreferences::default());

        assert_eq!(picker.roll(1, |_| 0).await.unwrap(), 40);
        assert_eq!(picker.roll(1, |_| 0).await.unwrap(), 41);
        assert_eq!(picker.history().items(), &[41, 40]);
    }

    #[tokio::test]
    async fn test_history_keeps_the_last_ten() {
        let source: Arc<dyn SearchSource<u32>> = Arc::new(search_fn(|request: SearchRequest| async move {
            Ok::<_, anyhow::Error>(ResultPage::new(request.page, vec![request.page]))
        }));
        let mut picker = RandomPicker::new(source, fallback(0), RandomPreferences::default());

        for page in 1..=12 {
            picker.roll(page, |_| 0).await.unwrap();
        }

        let history = picker.history().items();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], 12);
        assert_eq!(history[HISTORY_LIMIT - 1], 3);
        assert!(!picker.history().show_load_more());
    }
}
