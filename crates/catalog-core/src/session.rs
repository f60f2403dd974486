//! Async driver for the live search controller.
//!
//! A `SearchSession` owns a [`LiveSearch`] on its own tokio task. Events go in
//! over a channel; every state change is published on a watch channel and
//! navigations come out on a second channel. Preview searches run on a
//! `JoinSet`, and a search that has been superseded is aborted as well as
//! ignored. Dropping the session stops the task and everything it spawned.

use crate::fetcher::SearchSource;
use crate::page::ResultPage;
use crate::routes::Route;
use crate::search::{Key, LiveSearch, SearchSettings, SearchTicket};
use shared::Record;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error};

/// Something the user did to the search widget
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The input box now holds this text
    Input(String),
    Key(Key),
    /// A result in the dropdown was clicked
    Select(usize),
    /// The search form was submitted
    Submit,
    Focus,
    ClickOutside,
    PickTrending(usize),
}

impl SearchEvent {
    /// Apply the event to the controller, returning any navigation it causes
    pub fn apply<T: Record>(self, search: &mut LiveSearch<T>, now: Instant) -> Option<Route> {
        match self {
            SearchEvent::Input(text) => {
                search.input(&text, now);
                None
            }
            SearchEvent::Key(key) => search.key(key),
            SearchEvent::Select(index) => search.select(index),
            SearchEvent::Submit => search.submit(),
            SearchEvent::Focus => {
                search.focus();
                None
            }
            SearchEvent::ClickOutside => {
                search.click_outside();
                None
            }
            SearchEvent::PickTrending(index) => {
                search.pick_trending(index, now);
                None
            }
        }
    }
}

type Fetched<T> = (SearchTicket, anyhow::Result<ResultPage<T>>);

pub struct SearchSession<T> {
    events: mpsc::UnboundedSender<SearchEvent>,
    state: watch::Receiver<LiveSearch<T>>,
    navigations: mpsc::UnboundedReceiver<Route>,
    task: JoinHandle<()>,
}

impl<T> SearchSession<T>
where
    T: Record + Clone + Send + Sync + 'static,
{
    /// Mount a search widget backed by `source`
    pub fn spawn(source: Arc<dyn SearchSource<T>>, settings: SearchSettings) -> Self {
        let search = LiveSearch::new(settings);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(search.clone());
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(drive(search, source, events_rx, state_tx, nav_tx));

        Self {
            events: events_tx,
            state: state_rx,
            navigations: nav_rx,
            task,
        }
    }

    /// Send an event; false once the session has shut down
    pub fn send(&self, event: SearchEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn input(&self, text: impl Into<String>) -> bool {
        self.send(SearchEvent::Input(text.into()))
    }

    pub fn key(&self, key: Key) -> bool {
        self.send(SearchEvent::Key(key))
    }

    /// Latest controller state
    pub fn snapshot(&self) -> LiveSearch<T> {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<LiveSearch<T>> {
        self.state.clone()
    }

    /// Wait for the next navigation; `None` once the session has shut down
    pub async fn next_navigation(&mut self) -> Option<Route> {
        self.navigations.recv().await
    }

    pub fn try_navigation(&mut self) -> Option<Route> {
        self.navigations.try_recv().ok()
    }
}

impl<T> Drop for SearchSession<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive<T>(
    mut search: LiveSearch<T>,
    source: Arc<dyn SearchSource<T>>,
    mut events: mpsc::UnboundedReceiver<SearchEvent>,
    state: watch::Sender<LiveSearch<T>>,
    navigations: mpsc::UnboundedSender<Route>,
) where
    T: Record + Clone + Send + Sync + 'static,
{
    let mut fetches: JoinSet<Fetched<T>> = JoinSet::new();
    let mut current: Option<AbortHandle> = None;
    let limit = search.settings().preview_limit;

    loop {
        let wake = search.deadline();

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                if let Some(route) = event.apply(&mut search, Instant::now()) {
                    if navigations.send(route).is_err() {
                        debug!("Navigation dropped, nobody is listening");
                    }
                }
            }
            _ = sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                if let Some(ticket) = search.poll(Instant::now()) {
                    if let Some(previous) = current.take() {
                        previous.abort();
                    }
                    let source = Arc::clone(&source);
                    current = Some(fetches.spawn(async move {
                        let result = source.search(&ticket.request(limit)).await;
                        (ticket, result)
                    }));
                }
            }
            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                match joined {
                    Ok((ticket, result)) => {
                        search.complete(&ticket, result);
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!(error = %e, "Search task panicked"),
                }
            }
        }

        if search.in_flight().is_none() {
            if let Some(stale) = current.take() {
                stale.abort();
            }
        }

        state.send_replace(search.clone());
    }

    search.cancel();
    fetches.abort_all();
    debug!("Search session closed");
}
