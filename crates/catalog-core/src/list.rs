//! Incremental result list.
//!
//! State machine behind every result grid. It owns the loaded items and the
//! pagination state but performs no I/O: operations that need a page hand back
//! a [`FetchTicket`], and the caller reports the outcome through
//! [`IncrementalResultList::complete`]. At most one ticket is outstanding at a
//! time, and a ticket issued before a `retry` can no longer commit.

use crate::error::{ControllerError, LIST_LOAD_FAILED};
use crate::grid::{stats_line, GridConfig};
use crate::page::ResultPage;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Replace,
    Append,
}

/// Permission to fetch one page, redeemed via `complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Page to fetch
    pub page: u32,
    generation: u64,
    mode: FetchMode,
}

impl FetchTicket {
    /// Whether the page will be appended to the existing items
    pub fn is_append(&self) -> bool {
        self.mode == FetchMode::Append
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded,
}

/// Coarse state of the list, for choosing a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    /// Remote list that has not been started
    Idle,
    /// First page in flight with nothing to show yet
    Loading,
    /// Items are available (a load-more or an inline error may be pending)
    Ready,
    /// The first page came back empty
    Empty,
    /// The first page failed and there is nothing to show
    Failed,
}

/// Paginated collection backed by a static list or a remote page fetcher
#[derive(Debug, Clone)]
pub struct IncrementalResultList<T> {
    config: GridConfig,
    remote: bool,
    items: Vec<T>,
    page: u32,
    has_next: bool,
    total: Option<u32>,
    in_flight: Option<FetchTicket>,
    generation: u64,
    error: Option<ControllerError>,
    loaded: bool,
}

impl<T> IncrementalResultList<T> {
    /// A list over a fixed set of items, truncated to the configured cap
    pub fn from_items(mut items: Vec<T>, config: GridConfig) -> Self {
        items.truncate(config.cap);
        let total = Some(items.len() as u32);
        Self {
            config,
            remote: false,
            items,
            page: 1,
            has_next: false,
            total,
            in_flight: None,
            generation: 0,
            error: None,
            loaded: true,
        }
    }

    /// A list fed by a page fetcher; call `start` to request page 1
    pub fn remote(config: GridConfig) -> Self {
        Self {
            config,
            remote: true,
            items: Vec::new(),
            page: 0,
            has_next: false,
            total: None,
            in_flight: None,
            generation: 0,
            error: None,
            loaded: false,
        }
    }

    /// Replace the items of a static list (the caller's input changed)
    pub fn set_items(&mut self, mut items: Vec<T>) {
        items.truncate(self.config.cap);
        self.total = Some(items.len() as u32);
        self.items = items;
        self.error = None;
        self.loaded = true;
    }

    fn issue(&mut self, page: u32, mode: FetchMode) -> FetchTicket {
        let ticket = FetchTicket {
            page,
            generation: self.generation,
            mode,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Request the first page of a remote list
    pub fn start(&mut self) -> Option<FetchTicket> {
        self.retry()
    }

    /// Request the next page. Returns `None` when there is no next page, when
    /// a fetch is already in flight, or for static lists.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if !self.remote {
            return None;
        }
        if let Some(pending) = self.in_flight {
            debug!(page = pending.page, "Load more ignored, fetch already in flight");
            return None;
        }
        if !self.has_next {
            debug!(page = self.page, "Load more ignored, no next page");
            return None;
        }

        Some(self.issue(self.page + 1, FetchMode::Append))
    }

    /// Drop everything and request page 1 again. Any fetch still in flight
    /// loses its right to commit.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if !self.remote {
            return None;
        }

        self.generation += 1;
        self.items.clear();
        self.page = 0;
        self.has_next = false;
        self.total = None;
        self.error = None;
        self.loaded = false;

        Some(self.issue(1, FetchMode::Replace))
    }

    /// Report the outcome of a ticket
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: anyhow::Result<ResultPage<T>>,
    ) -> Completion {
        if ticket.generation != self.generation || self.in_flight != Some(ticket) {
            debug!(page = ticket.page, "Discarding stale page");
            return Completion::Discarded;
        }
        self.in_flight = None;
        self.loaded = true;

        match result {
            Ok(page) => {
                let has_next = page.resolve_has_next(self.config.page_size);
                let total = page.total_count;
                let mut items = page.items;

                match ticket.mode {
                    FetchMode::Replace => {
                        if !self.config.show_load_more {
                            items.truncate(self.config.cap);
                        }
                        self.items = items;
                        self.total = total;
                    }
                    FetchMode::Append => {
                        self.items.extend(items);
                        self.total = total.or(self.total);
                    }
                }

                self.page = ticket.page;
                self.has_next = has_next;
                self.error = None;

                debug!(
                    page = self.page,
                    items = self.items.len(),
                    has_next = self.has_next,
                    "Page applied"
                );
            }
            Err(e) => {
                warn!(page = ticket.page, error = %format!("{:#}", e), "Failed to load page");
                self.error = Some(ControllerError::new(LIST_LOAD_FAILED, e));
            }
        }

        Completion::Applied
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Last page successfully loaded (0 before the first page lands)
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn total(&self) -> Option<u32> {
        self.total
    }

    pub fn error(&self) -> Option<&ControllerError> {
        self.error.as_ref()
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// First page in flight
    pub fn is_loading(&self) -> bool {
        matches!(self.in_flight, Some(t) if t.mode == FetchMode::Replace)
    }

    /// Follow-up page in flight
    pub fn is_loading_more(&self) -> bool {
        matches!(self.in_flight, Some(t) if t.mode == FetchMode::Append)
    }

    pub fn status(&self) -> ListStatus {
        if !self.items.is_empty() {
            ListStatus::Ready
        } else if self.error.is_some() {
            ListStatus::Failed
        } else if self.is_loading() {
            ListStatus::Loading
        } else if self.loaded {
            ListStatus::Empty
        } else {
            ListStatus::Idle
        }
    }

    /// Whether to render the load-more affordance
    pub fn show_load_more(&self) -> bool {
        self.config.show_load_more && self.has_next && !self.items.is_empty()
    }

    /// The stats line, when enabled and there is something to count
    pub fn stats(&self, noun: &str) -> Option<String> {
        if self.config.show_stats && !self.items.is_empty() {
            Some(stats_line(self.items.len(), self.total, noun))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridOptions, GridVariant};

    fn remote() -> IncrementalResultList<char> {
        IncrementalResultList::remote(GridConfig::default())
    }

    fn page(n: u32, items: &str, has_next: bool) -> anyhow::Result<ResultPage<char>> {
        Ok(ResultPage::new(n, items.chars().collect()).with_next(has_next))
    }

    #[test]
    fn test_load_more_appends_and_hides_button() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        assert_eq!(list.status(), ListStatus::Loading);
        assert_eq!(list.complete(t1, page(1, "abc", true)), Completion::Applied);

        assert_eq!(list.items(), &['a', 'b', 'c']);
        assert!(list.show_load_more());

        let t2 = list.load_more().unwrap();
        assert_eq!(t2.page, 2);
        assert!(t2.is_append());
        assert!(list.is_loading_more());
        list.complete(t2, page(2, "de", false));

        assert_eq!(list.items(), &['a', 'b', 'c', 'd', 'e']);
        assert!(!list.show_load_more());
        assert!(list.load_more().is_none());
    }

    #[test]
    fn test_pages_accumulate_in_order() {
        let mut list = remote();
        let pages = ["ab", "cd", "ef", "g"];
        let mut ticket = list.start();

        for (i, chunk) in pages.iter().enumerate() {
            let t = ticket.take().unwrap();
            assert_eq!(t.page, i as u32 + 1);
            list.complete(t, page(t.page, chunk, i + 1 < pages.len()));
            ticket = list.load_more();
        }

        assert!(ticket.is_none());
        assert_eq!(list.items().iter().collect::<String>(), "abcdefg");
        assert_eq!(list.page(), 4);
    }

    #[test]
    fn test_second_load_more_is_noop_while_in_flight() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        assert!(list.load_more().is_none());
        list.complete(t1, page(1, "abc", true));

        let first = list.load_more();
        let second = list.load_more();
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn test_first_page_failure_then_retry() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(t1, Err(anyhow::anyhow!("503 Service Unavailable")));

        assert_eq!(list.status(), ListStatus::Failed);
        let error = list.error().unwrap();
        assert_eq!(error.message, "Failed to load data");
        assert!(error.cause().to_string().contains("503"));

        let retry = list.retry().unwrap();
        assert_eq!(retry.page, 1);
        assert!(list.error().is_none());
        assert_eq!(list.status(), ListStatus::Loading);

        list.complete(retry, page(1, "xy", false));
        assert_eq!(list.status(), ListStatus::Ready);
        assert!(list.error().is_none());
        assert_eq!(list.items(), &['x', 'y']);
    }

    #[test]
    fn test_retry_failure_again_reports_error() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(t1, Err(anyhow::anyhow!("boom")));
        let t2 = list.retry().unwrap();
        list.complete(t2, Err(anyhow::anyhow!("boom again")));
        assert_eq!(list.status(), ListStatus::Failed);
    }

    #[test]
    fn test_load_more_failure_keeps_items() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(t1, page(1, "abc", true));
        let t2 = list.load_more().unwrap();
        list.complete(t2, Err(anyhow::anyhow!("timeout")));

        assert_eq!(list.status(), ListStatus::Ready);
        assert_eq!(list.items().len(), 3);
        assert!(list.error().is_some());
        assert_eq!(list.page(), 1);

        // The next attempt asks for the same page again
        assert_eq!(list.load_more().unwrap().page, 2);
    }

    #[test]
    fn test_retry_invalidates_in_flight_append() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(t1, page(1, "abc", true));
        let stale = list.load_more().unwrap();

        let fresh = list.retry().unwrap();
        assert!(list.items().is_empty());

        assert_eq!(list.complete(stale, page(2, "zz", false)), Completion::Discarded);
        assert!(list.items().is_empty());

        assert_eq!(list.complete(fresh, page(1, "q", false)), Completion::Applied);
        assert_eq!(list.items(), &['q']);
    }

    #[test]
    fn test_ticket_cannot_be_redeemed_twice() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(t1, page(1, "ab", true));
        assert_eq!(list.complete(t1, page(1, "ab", true)), Completion::Discarded);
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_empty_first_page_is_not_an_error() {
        let mut list = remote();
        assert_eq!(list.status(), ListStatus::Idle);
        let t1 = list.start().unwrap();
        list.complete(t1, page(1, "", false));
        assert_eq!(list.status(), ListStatus::Empty);
        assert!(list.error().is_none());
        assert!(list.stats("anime").is_none());
    }

    #[test]
    fn test_short_page_without_flag_ends_data() {
        let config = GridOptions {
            page_size: Some(3),
            ..GridOptions::default()
        }
        .resolve();
        let mut list = IncrementalResultList::remote(config);

        let t1 = list.start().unwrap();
        list.complete(t1, Ok(ResultPage::new(1, vec!['a', 'b', 'c'])));
        assert!(list.has_next());

        let t2 = list.load_more().unwrap();
        list.complete(t2, Ok(ResultPage::new(2, vec!['d'])));
        assert!(!list.has_next());
    }

    #[test]
    fn test_static_items_are_capped() {
        let config = GridOptions::variant(GridVariant::Featured).resolve();
        let mut list = IncrementalResultList::from_items((0..20).collect::<Vec<u32>>(), config);

        assert_eq!(list.items().len(), 8);
        assert_eq!(list.status(), ListStatus::Ready);
        assert!(list.load_more().is_none());
        assert!(list.retry().is_none());

        list.set_items(vec![1, 2]);
        assert_eq!(list.items(), &[1, 2]);
    }

    #[test]
    fn test_preview_grid_caps_remote_page() {
        let config = GridOptions {
            variant: GridVariant::Minimalist,
            limit: Some(2),
            show_load_more: false,
            ..GridOptions::default()
        }
        .resolve();
        let mut list = IncrementalResultList::remote(config);
        let t1 = list.start().unwrap();
        list.complete(t1, page(1, "abcdef", true));

        assert_eq!(list.items(), &['a', 'b']);
        assert!(!list.show_load_more());
    }

    #[test]
    fn test_stats_use_total() {
        let mut list = remote();
        let t1 = list.start().unwrap();
        list.complete(
            t1,
            Ok(ResultPage::new(1, vec!['a', 'b']).with_next(true).with_total(40)),
        );
        assert_eq!(list.stats("anime").as_deref(), Some("Showing 2 of 40 anime"));

        let t2 = list.load_more().unwrap();
        list.complete(t2, page(2, "c", false));
        assert_eq!(list.stats("anime").as_deref(), Some("Showing 3 of 40 anime"));
    }
}
