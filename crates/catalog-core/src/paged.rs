//! Async driver for a remote result grid.
//!
//! `PagedGrid` pairs an [`IncrementalResultList`] with the page fetcher it
//! pulls from. The list sits behind a mutex that is only held to take or
//! redeem a ticket, never while a page is being fetched, so `load_more` and
//! `retry` can be called from concurrent tasks.

use crate::fetcher::PageFetcher;
use crate::grid::GridConfig;
use crate::list::{Completion, FetchTicket, IncrementalResultList};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub struct PagedGrid<T> {
    list: Arc<Mutex<IncrementalResultList<T>>>,
    fetcher: Arc<dyn PageFetcher<T>>,
}

impl<T> Clone for PagedGrid<T> {
    fn clone(&self) -> Self {
        Self {
            list: Arc::clone(&self.list),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T: Send + 'static> PagedGrid<T> {
    pub fn new(fetcher: Arc<dyn PageFetcher<T>>, config: GridConfig) -> Self {
        Self {
            list: Arc::new(Mutex::new(IncrementalResultList::remote(config))),
            fetcher,
        }
    }

    fn lock(&self) -> MutexGuard<'_, IncrementalResultList<T>> {
        self.list.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, ticket: Option<FetchTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        debug!(page = ticket.page, append = ticket.is_append(), "Fetching page");
        let result = self.fetcher.fetch_page(ticket.page).await;
        let completion = self.lock().complete(ticket, result);
        completion == Completion::Applied
    }

    /// Load page 1. Returns whether the outcome was applied.
    pub async fn init(&self) -> bool {
        let ticket = self.lock().start();
        self.run(ticket).await
    }

    /// Load the next page; a no-op while another fetch is in flight
    pub async fn load_more(&self) -> bool {
        let ticket = self.lock().load_more();
        self.run(ticket).await
    }

    /// Drop all items and load page 1 again
    pub async fn retry(&self) -> bool {
        let ticket = self.lock().retry();
        self.run(ticket).await
    }

    /// Run `f` against the current list state
    pub fn with<R>(&self, f: impl FnOnce(&IncrementalResultList<T>) -> R) -> R {
        f(&self.lock())
    }
}

impl<T: Clone + Send + 'static> PagedGrid<T> {
    pub fn snapshot(&self) -> IncrementalResultList<T> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::page_fn;
    use crate::list::ListStatus;
    use crate::page::ResultPage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Three pages of two items; every fetch takes 100ms
    fn slow_pages(calls: Arc<AtomicU32>) -> Arc<dyn PageFetcher<u32>> {
        Arc::new(page_fn(move |page: u32| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                let first = (page - 1) * 2;
                Ok::<_, anyhow::Error>(
                    ResultPage::new(page, vec![first, first + 1]).with_next(page < 3),
                )
            }
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_load_more_fetches_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let grid = PagedGrid::new(slow_pages(Arc::clone(&calls)), GridConfig::default());

        assert!(grid.init().await);
        let (first, second) = tokio::join!(grid.load_more(), grid.load_more());

        assert!(first ^ second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(grid.with(|list| list.items().to_vec()), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_load_more_reaches_end() {
        let calls = Arc::new(AtomicU32::new(0));
        let grid = PagedGrid::new(slow_pages(Arc::clone(&calls)), GridConfig::default());

        grid.init().await;
        while grid.load_more().await {}

        let list = grid.snapshot();
        assert_eq!(list.items(), &[0, 1, 2, 3, 4, 5]);
        assert!(!list.has_next());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_wins_over_in_flight_load_more() {
        let calls = Arc::new(AtomicU32::new(0));
        let grid = PagedGrid::new(slow_pages(Arc::clone(&calls)), GridConfig::default());
        grid.init().await;

        let background = grid.clone();
        let pending = tokio::spawn(async move { background.load_more().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(grid.retry().await);
        assert!(!pending.await.unwrap());
        assert_eq!(grid.with(|list| list.items().to_vec()), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_failed_first_page_then_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let fetcher: Arc<dyn PageFetcher<u32>> = Arc::new(page_fn(move |page: u32| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow::anyhow!("connection refused"))
                } else {
                    Ok(ResultPage::new(page, vec![7u32]).with_next(false))
                }
            }
        }));
        let grid = PagedGrid::new(fetcher, GridConfig::default());

        grid.init().await;
        assert_eq!(grid.with(|list| list.status()), ListStatus::Failed);

        grid.retry().await;
        let list = grid.snapshot();
        assert_eq!(list.status(), ListStatus::Ready);
        assert!(list.error().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
