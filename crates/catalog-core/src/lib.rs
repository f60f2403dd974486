//! Controllers behind the catalog views.
//!
//! - [`list`]: incremental result list (paged grids with load-more and retry)
//! - [`search`]: live search with debounce, stale-response guard and keyboard navigation
//! - [`paged`] and [`session`]: async drivers that run the two controllers on tokio
//! - [`detail`]: detail pages whose sections load and fail independently
//! - [`random`]: random discovery with a short history of picks
//! - [`grid`]: layout presets, [`routes`]: navigation targets
//!
//! Both controllers are plain state machines. They take the data they need
//! through the [`fetcher`] traits and never talk to the network themselves.

pub mod detail;
pub mod error;
pub mod fetcher;
pub mod grid;
pub mod list;
pub mod page;
pub mod paged;
pub mod random;
pub mod routes;
pub mod search;
pub mod session;

pub use detail::{DetailPage, DetailSource, Section};
pub use error::ControllerError;
pub use fetcher::{page_fn, search_fn, PageFetcher, SearchPages, SearchRequest, SearchSource};
pub use grid::{GridConfig, GridOptions, GridVariant};
pub use list::{Completion, FetchTicket, IncrementalResultList, ListStatus};
pub use page::ResultPage;
pub use paged::PagedGrid;
pub use random::{RandomFallback, RandomPicker, RandomPreferences};
pub use routes::{Route, RouteError};
pub use search::{DropdownView, Key, LiveSearch, SearchSettings, SearchStatus, TRENDING};
pub use session::{SearchEvent, SearchSession};
