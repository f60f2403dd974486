//! Live search controller.
//!
//! Turns keystrokes into debounced preview searches and keyboard navigation.
//! Like the result list, the controller does no I/O and reads no clock: the
//! caller passes the current instant in, polls when [`LiveSearch::deadline`]
//! passes, runs the returned [`SearchTicket`] and reports back through
//! [`LiveSearch::complete`]. Only the ticket for the current debounced query
//! can commit.

use crate::error::{ControllerError, SEARCH_FAILED};
use crate::fetcher::SearchRequest;
use crate::list::Completion;
use crate::page::ResultPage;
use crate::routes::Route;
use shared::config::SearchConfig;
use shared::{MediaKind, Record};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Suggestions shown while the input is empty
pub const TRENDING: [&str; 8] = [
    "Attack on Titan",
    "Demon Slayer",
    "Jujutsu Kaisen",
    "One Piece",
    "Naruto",
    "Dragon Ball",
    "My Hero Academia",
    "Death Note",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub debounce: Duration,
    /// Minimum trimmed length, in characters, that triggers a fetch
    pub min_query_len: usize,
    /// Results kept for the dropdown
    pub preview_limit: u32,
    /// Catalog the full-search routes point at
    pub kind: MediaKind,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 2,
            preview_limit: 8,
            kind: MediaKind::Anime,
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_query_len: config.min_query_len.max(1),
            preview_limit: config.preview_limit.max(1),
            kind: MediaKind::Anime,
        }
    }

    /// Same settings, searching another catalog
    pub fn for_kind(self, kind: MediaKind) -> Self {
        Self { kind, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Debouncing,
    Loading,
    Success,
    NoResults,
    Error,
}

/// Keys the dropdown reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Permission to run one preview search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub query: String,
    generation: u64,
}

impl SearchTicket {
    pub fn request(&self, limit: u32) -> SearchRequest {
        SearchRequest::preview(self.query.clone(), limit)
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Pending,
    Loaded,
    Failed(ControllerError),
}

/// What the dropdown under the search box shows
#[derive(Debug, PartialEq)]
pub enum DropdownView<'a, T> {
    Hidden,
    Trending(&'static [&'static str]),
    Loading,
    Results {
        items: &'a [T],
        selected: Option<usize>,
        /// Link to the full search page when the preview is full
        view_all: Option<Route>,
    },
    NoResults {
        query: &'a str,
        /// Full search for the query anyway
        search: Route,
    },
    Error {
        message: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct LiveSearch<T> {
    settings: SearchSettings,
    raw: String,
    debounced: String,
    deadline: Option<Instant>,
    generation: u64,
    in_flight: Option<SearchTicket>,
    results: Vec<T>,
    outcome: Outcome,
    selected: Option<usize>,
    open: bool,
    focused: bool,
}

impl<T> LiveSearch<T> {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            raw: String::new(),
            debounced: String::new(),
            deadline: None,
            generation: 0,
            in_flight: None,
            results: Vec::new(),
            outcome: Outcome::Pending,
            selected: None,
            open: false,
            focused: false,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// An empty query is never sent, whatever the configured minimum
    fn is_searchable(&self, query: &str) -> bool {
        !query.is_empty() && query.chars().count() >= self.settings.min_query_len
    }

    /// Dropdown opens on an empty input (trending) or a searchable one
    fn wants_dropdown(&self) -> bool {
        let query = self.raw.trim();
        query.is_empty() || self.is_searchable(query)
    }

    /// Forget the current query and anything in flight for it
    fn reset_query(&mut self) {
        self.generation += 1;
        self.deadline = None;
        self.in_flight = None;
        self.results.clear();
        self.outcome = Outcome::Pending;
        self.selected = None;
    }

    /// The input box now holds `text`
    pub fn input(&mut self, text: &str, now: Instant) {
        self.raw = text.to_string();
        self.focused = true;
        self.selected = None;

        let query = text.trim();
        if !self.is_searchable(query) {
            if self.in_flight.is_some() {
                debug!(query = %self.debounced, "Query cleared, dropping in-flight search");
            }
            self.reset_query();
            self.debounced = query.to_string();
        } else if query == self.debounced
            && (self.in_flight.is_some() || !matches!(self.outcome, Outcome::Pending))
        {
            // Back to the query already searched for
            self.deadline = None;
        } else {
            self.deadline = Some(now + self.settings.debounce);
        }

        self.open = self.wants_dropdown();
    }

    /// When the pending debounce elapses, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Issue a search if the quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<SearchTicket> {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return None,
        }

        self.deadline = None;
        self.generation += 1;
        self.debounced = self.raw.trim().to_string();
        self.results.clear();
        self.outcome = Outcome::Pending;
        self.selected = None;

        let ticket = SearchTicket {
            query: self.debounced.clone(),
            generation: self.generation,
        };
        self.in_flight = Some(ticket.clone());
        debug!(query = %ticket.query, "Issuing search");
        Some(ticket)
    }

    /// Report the outcome of a ticket. Results for anything but the current
    /// debounced query are dropped.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        result: anyhow::Result<ResultPage<T>>,
    ) -> Completion {
        if self.in_flight.as_ref() != Some(ticket) || ticket.query != self.debounced {
            debug!(query = %ticket.query, current = %self.debounced, "Discarding stale search results");
            return Completion::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let mut items = page.items;
                items.truncate(self.settings.preview_limit as usize);
                debug!(query = %ticket.query, results = items.len(), "Search results applied");
                self.results = items;
                self.outcome = Outcome::Loaded;
            }
            Err(e) => {
                warn!(query = %ticket.query, error = %format!("{:#}", e), "Search failed");
                self.results.clear();
                self.outcome = Outcome::Failed(ControllerError::new(SEARCH_FAILED, e));
            }
        }
        self.selected = None;

        Completion::Applied
    }

    /// Unmount: nothing in flight may commit afterwards
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.deadline = None;
        self.in_flight = None;
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.open = self.wants_dropdown();
    }

    /// A click landed outside the widget
    pub fn click_outside(&mut self) {
        self.open = false;
    }

    /// Fill the input with a trending term and open the dropdown
    pub fn pick_trending(&mut self, index: usize, now: Instant) -> bool {
        let Some(term) = TRENDING.get(index) else {
            return false;
        };
        self.input(term, now);
        self.focus();
        true
    }

    pub fn raw_query(&self) -> &str {
        &self.raw
    }

    pub fn debounced_query(&self) -> &str {
        &self.debounced
    }

    /// The search currently awaiting its results
    pub fn in_flight(&self) -> Option<&SearchTicket> {
        self.in_flight.as_ref()
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn error(&self) -> Option<&ControllerError> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> SearchStatus {
        if !self.is_searchable(self.raw.trim()) {
            return SearchStatus::Idle;
        }
        if self.deadline.is_some() {
            return SearchStatus::Debouncing;
        }
        if self.in_flight.is_some() {
            return SearchStatus::Loading;
        }
        match self.outcome {
            Outcome::Pending => SearchStatus::Idle,
            Outcome::Loaded if self.results.is_empty() => SearchStatus::NoResults,
            Outcome::Loaded => SearchStatus::Success,
            Outcome::Failed(_) => SearchStatus::Error,
        }
    }

    fn view_all(&self) -> Option<Route> {
        if self.results.len() >= self.settings.preview_limit as usize {
            Some(Route::search_for(self.settings.kind, self.debounced.clone()))
        } else {
            None
        }
    }

    pub fn view(&self) -> DropdownView<'_, T> {
        if !self.open {
            return DropdownView::Hidden;
        }
        if self.raw.trim().is_empty() {
            return DropdownView::Trending(&TRENDING);
        }

        let results = DropdownView::Results {
            items: &self.results,
            selected: self.selected,
            view_all: self.view_all(),
        };

        match self.status() {
            SearchStatus::Idle => DropdownView::Hidden,
            SearchStatus::Debouncing if !self.results.is_empty() => results,
            SearchStatus::Debouncing | SearchStatus::Loading => DropdownView::Loading,
            SearchStatus::Success => results,
            SearchStatus::NoResults => DropdownView::NoResults {
                query: &self.debounced,
                search: Route::search_for(self.settings.kind, self.debounced.clone()),
            },
            SearchStatus::Error => DropdownView::Error {
                message: SEARCH_FAILED,
            },
        }
    }

    /// Clear the box and close the dropdown ahead of a navigation
    fn navigate(&mut self, route: Route) -> Route {
        self.reset_query();
        self.raw.clear();
        self.debounced.clear();
        self.open = false;
        debug!(route = %route, "Navigating");
        route
    }

    /// Full-search route for whatever is typed
    pub fn submit(&mut self) -> Option<Route> {
        let query = self.raw.trim();
        if query.is_empty() {
            return None;
        }
        let route = Route::search_for(self.settings.kind, query);
        Some(self.navigate(route))
    }
}

impl<T: Record> LiveSearch<T> {
    /// A result was clicked
    pub fn select(&mut self, index: usize) -> Option<Route> {
        let route = Route::for_record(self.results.get(index)?);
        Some(self.navigate(route))
    }

    pub fn key(&mut self, key: Key) -> Option<Route> {
        let showing_results = self.open && !self.results.is_empty();

        match key {
            Key::ArrowDown if showing_results => {
                let last = self.results.len() - 1;
                self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
                None
            }
            Key::ArrowUp if showing_results => {
                self.selected = self.selected.and_then(|i| i.checked_sub(1));
                None
            }
            Key::ArrowDown | Key::ArrowUp => None,
            Key::Enter => match self.selected {
                Some(index) if showing_results => self.select(index),
                _ => self.submit(),
            },
            Key::Escape => {
                self.open = false;
                self.focused = false;
                None
            }
        }
    }
}
