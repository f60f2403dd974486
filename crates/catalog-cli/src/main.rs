//! anidex: browse the MyAnimeList catalog from the terminal.

mod live;
mod render;
mod sources;

use anyhow::{bail, Context, Result};
use catalog_core::grid::{GridOptions, GridVariant};
use catalog_core::random::RANDOM_PAGES;
use catalog_core::{
    detail, IncrementalResultList, ListStatus, PageFetcher, PagedGrid, RandomPicker,
    RandomPreferences, Route, SearchPages, SearchSettings, SearchSource,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use jikan_client::{JikanClient, QueryCache, TopAnimeFilter, TopMangaFilter};
use rand::Rng;
use render::Card;
use shared::{AnimeSummary, Config, FilterState, LogConfig, MangaSummary, MediaKind};
use sources::{
    AnimeDetails, AnimeSearch, MangaDetails, MangaSearch, RandomAnime, SeasonPages, TopAnimePages,
    TopMangaPages,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "anidex", author, version, about = "Browse the MyAnimeList catalog", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewport width in pixels, selects the grid breakpoint
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search anime or manga
    Search {
        query: String,

        /// Search manga instead of anime
        #[arg(long)]
        manga: bool,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Open a route such as /anime/5114, /search?q=frieren&type=tv or /manga/search?q=berserk
    Open {
        route: String,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Top ranked anime or manga
    Top {
        #[arg(long)]
        manga: bool,

        /// airing, upcoming, bypopularity, favorite (publishing for manga)
        #[arg(long)]
        filter: Option<String>,

        #[arg(long, default_value = "full")]
        variant: GridVariant,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Anime airing this season
    Seasonal {
        #[arg(long, default_value = "full")]
        variant: GridVariant,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Broadcast schedule
    Schedule,

    /// Anime genres
    Genres,

    /// Random anime, narrowed by preferences
    Random {
        #[command(flatten)]
        preferences: RandomArgs,

        /// Number of picks; every pick is added to the history
        #[arg(long, default_value_t = 1)]
        rolls: u32,
    },

    /// Anime details
    Anime { id: u32 },

    /// Manga details
    Manga { id: u32 },

    /// Interactive search-as-you-type
    Live {
        #[arg(long)]
        manga: bool,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// tv, movie, ova, special, ona, music (manga, novel, ... for manga)
    #[arg(long = "type")]
    media_type: Option<String>,

    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    rating: Option<String>,

    #[arg(long)]
    order_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    sort: Option<String>,

    /// Genre id, repeatable
    #[arg(long = "genre")]
    genres: Vec<u32>,

    #[arg(long)]
    min_score: Option<f64>,

    #[arg(long)]
    max_score: Option<f64>,

    #[arg(long)]
    start_year: Option<i32>,

    #[arg(long)]
    end_year: Option<i32>,
}

impl FilterArgs {
    /// Filters as they would be read back from a shared URL
    fn to_filters(&self) -> FilterState {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        let text = [
            ("type", &self.media_type),
            ("status", &self.status),
            ("rating", &self.rating),
            ("order_by", &self.order_by),
            ("sort", &self.sort),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        if !self.genres.is_empty() {
            let ids: Vec<String> = self.genres.iter().map(|id| id.to_string()).collect();
            pairs.push(("genres", ids.join(",")));
        }
        if let Some(score) = self.min_score {
            pairs.push(("min_score", score.to_string()));
        }
        if let Some(score) = self.max_score {
            pairs.push(("max_score", score.to_string()));
        }
        if let Some(year) = self.start_year {
            pairs.push(("start_year", year.to_string()));
        }
        if let Some(year) = self.end_year {
            pairs.push(("end_year", year.to_string()));
        }

        FilterState::from_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
    }
}

#[derive(ClapArgs, Debug, Default)]
struct RandomArgs {
    /// tv, movie, ova or special
    #[arg(long = "type")]
    media_type: Option<String>,

    /// Genre id
    #[arg(long)]
    genre: Option<u32>,

    /// airing, complete or upcoming
    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    min_score: Option<f64>,
}

impl RandomArgs {
    fn to_preferences(&self) -> RandomPreferences {
        let non_all = |value: &Option<String>| value.clone().filter(|v| v != "all");
        RandomPreferences {
            media_type: non_all(&self.media_type),
            genre: self.genre,
            status: non_all(&self.status),
            min_score: self.min_score.filter(|s| s.is_finite() && (0.0..=10.0).contains(s)),
        }
    }
}

#[derive(ClapArgs, Debug, Clone, Copy)]
struct PagingArgs {
    /// Number of pages to load (each after the first is a "load more")
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Times to retry when the first page fails
    #[arg(long, default_value_t = 0)]
    retry: u32,
}

/// Everything a command needs
struct App {
    config: Config,
    client: Arc<JikanClient>,
    width: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, "anidex");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "anidex starting");

    // One cache for every view in the process
    let cache = Arc::new(QueryCache::from_config(&config.cache));
    let client = JikanClient::new(&config.api, Arc::clone(&cache))
        .context("Failed to create Jikan client")?;

    let app = App {
        config,
        client: Arc::new(client),
        width: args.width,
    };

    app.run(args.command).await?;

    let stats = cache.stats();
    let requests = app.client.rate_limit_usage().await;
    debug!(
        cached = stats.total_entries,
        fresh = stats.fresh_entries,
        requests_last_minute = requests,
        "anidex finished"
    );

    Ok(())
}

impl App {
    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Search {
                query,
                manga,
                filters,
                paging,
            } => {
                let kind = if manga { MediaKind::Manga } else { MediaKind::Anime };
                self.search(kind, &query, filters.to_filters(), paging).await
            }
            Command::Open { route, paging } => {
                let route = Route::parse(&route)?;
                self.open(&route, paging).await
            }
            Command::Top {
                manga,
                filter,
                variant,
                paging,
            } => {
                let limit = self.config.grid.page_size;
                if manga {
                    let filter = filter
                        .map(|f| f.parse::<TopMangaFilter>())
                        .transpose()
                        .map_err(anyhow::Error::msg)?;
                    let fetcher = TopMangaPages {
                        client: Arc::clone(&self.client),
                        filter,
                        limit,
                    };
                    self.grid::<MangaSummary>(Arc::new(fetcher), limit, variant, paging, "manga")
                        .await
                } else {
                    let filter = filter
                        .map(|f| f.parse::<TopAnimeFilter>())
                        .transpose()
                        .map_err(anyhow::Error::msg)?;
                    let fetcher = TopAnimePages {
                        client: Arc::clone(&self.client),
                        filter,
                        limit,
                    };
                    self.grid::<AnimeSummary>(Arc::new(fetcher), limit, variant, paging, "anime")
                        .await
                }
            }
            Command::Seasonal { variant, paging } => {
                let limit = self.config.grid.page_size;
                let fetcher = SeasonPages {
                    client: Arc::clone(&self.client),
                    limit,
                };
                self.grid::<AnimeSummary>(Arc::new(fetcher), limit, variant, paging, "anime").await
            }
            Command::Schedule => self.schedule().await,
            Command::Genres => {
                let genres = self.client.anime_genres().await?;
                print!("{}", render::genres(&genres));
                Ok(())
            }
            Command::Random { preferences, rolls } => {
                self.random(preferences.to_preferences(), rolls).await
            }
            Command::Anime { id } => self.open(&Route::AnimeDetail(id), PagingArgs::single()).await,
            Command::Manga { id } => self.open(&Route::MangaDetail(id), PagingArgs::single()).await,
            Command::Live { manga } => self.live(manga).await,
        }
    }

    /// Render a remote grid after loading the requested number of pages.
    /// `page_size` must be what the fetcher asks for, short pages end the data.
    async fn grid<T>(
        &self,
        fetcher: Arc<dyn PageFetcher<T>>,
        page_size: u32,
        variant: GridVariant,
        paging: PagingArgs,
        noun: &str,
    ) -> Result<()>
    where
        T: Card + Clone + Send + 'static,
    {
        let config = grid_config(variant, page_size);
        let grid = PagedGrid::new(fetcher, config);

        grid.init().await;
        for attempt in 1..=paging.retry {
            if grid.with(|list| list.status()) != ListStatus::Failed {
                break;
            }
            info!(attempt = attempt, "Retrying first page");
            grid.retry().await;
        }
        for _ in 1..paging.pages {
            if !grid.load_more().await || grid.with(|list| list.error().is_some()) {
                break;
            }
        }

        print!("{}", render::grid(&grid.snapshot(), self.width, noun));
        Ok(())
    }

    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        filters: FilterState,
        paging: PagingArgs,
    ) -> Result<()> {
        let route = Route::Search {
            kind,
            query: query.to_string(),
            filters: filters.clone(),
        };
        println!("{}", route);
        if filters.active_count() > 0 {
            println!("{} filter(s) active", filters.active_count());
        }
        println!();

        let limit = self.config.search.page_size;
        match kind {
            MediaKind::Anime => {
                let source: Arc<dyn SearchSource<AnimeSummary>> = Arc::new(AnimeSearch::new(Arc::clone(&self.client)));
                let pages = SearchPages::new(source, query, filters, limit);
                self.grid::<AnimeSummary>(Arc::new(pages), limit, GridVariant::Full, paging, "anime")
                    .await
            }
            MediaKind::Manga => {
                let source: Arc<dyn SearchSource<MangaSummary>> = Arc::new(MangaSearch::new(Arc::clone(&self.client)));
                let pages = SearchPages::new(source, query, filters, limit);
                self.grid::<MangaSummary>(Arc::new(pages), limit, GridVariant::Full, paging, "manga")
                    .await
            }
        }
    }

    async fn open(&self, route: &Route, paging: PagingArgs) -> Result<()> {
        match route {
            Route::Home => self.schedule().await,
            Route::AnimeDetail(id) => {
                let source = AnimeDetails {
                    client: Arc::clone(&self.client),
                };
                let page = detail::load(&source, *id).await?;
                print!("{}", render::anime_page(&page, self.width));
                Ok(())
            }
            Route::MangaDetail(id) => {
                let source = MangaDetails {
                    client: Arc::clone(&self.client),
                };
                let page = detail::load(&source, *id).await?;
                print!("{}", render::manga_page(&page, self.width));
                Ok(())
            }
            Route::Search {
                kind,
                query,
                filters,
            } => {
                if query.trim().is_empty() {
                    bail!("Search route has no query");
                }
                self.search(*kind, query, filters.clone(), paging).await
            }
        }
    }

    /// The schedule is one fixed page, shown as a static grid
    async fn schedule(&self) -> Result<()> {
        let config = GridOptions::variant(GridVariant::Featured).resolve();
        let list = match self.client.schedules(config.cap as u32).await {
            Ok(response) => IncrementalResultList::from_items(response.data, config),
            Err(e) => {
                // Same inline error a failed grid shows
                let mut list = IncrementalResultList::remote(config);
                if let Some(ticket) = list.start() {
                    list.complete(ticket, Err(e.into()));
                }
                list
            }
        };

        println!("Airing schedule\n");
        print!("{}", render::grid(&list, self.width, "anime"));
        Ok(())
    }

    /// Roll `rolls` random picks, then show the history
    async fn random(&self, preferences: RandomPreferences, rolls: u32) -> Result<()> {
        let source: Arc<dyn SearchSource<AnimeSummary>> =
            Arc::new(AnimeSearch::new(Arc::clone(&self.client)));
        let fallback = Arc::new(RandomAnime {
            client: Arc::clone(&self.client),
        });
        let mut picker = RandomPicker::new(source, fallback, preferences);

        for _ in 0..rolls.max(1) {
            let page = rand::thread_rng().gen_range(1..=RANDOM_PAGES);
            let anime = picker
                .roll(page, |found| rand::thread_rng().gen_range(0..found))
                .await?;
            print!("{}", render::pick(&anime));
            println!();
        }

        let history = picker.history();
        println!("Recently discovered ({})\n", history.items().len());
        print!("{}", render::cards(history, self.width));
        Ok(())
    }

    async fn live(&self, manga: bool) -> Result<()> {
        let settings = SearchSettings::from_config(&self.config.search);
        let open = |route: Route| async move { self.open(&route, PagingArgs::single()).await };

        if manga {
            let settings = settings.for_kind(MediaKind::Manga);
            let source: Arc<dyn SearchSource<MangaSummary>> = Arc::new(MangaSearch::new(Arc::clone(&self.client)));
            live::run(source, settings, open).await
        } else {
            let source: Arc<dyn SearchSource<AnimeSummary>> = Arc::new(AnimeSearch::new(Arc::clone(&self.client)));
            live::run(source, settings, open).await
        }
    }
}

impl PagingArgs {
    fn single() -> Self {
        Self { pages: 1, retry: 0 }
    }
}

/// Grid configuration for a fetcher requesting `page_size` items per page
fn grid_config(variant: GridVariant, page_size: u32) -> catalog_core::GridConfig {
    GridOptions {
        page_size: Some(page_size as usize),
        ..GridOptions::variant(variant)
    }
    .resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "anidex", "search", "frieren", "--type", "tv", "--genre", "1", "--genre", "2", "--pages", "3",
        ])
        .unwrap();

        match args.command {
            Command::Search {
                query,
                manga,
                filters,
                paging,
            } => {
                assert_eq!(query, "frieren");
                assert!(!manga);
                let filters = filters.to_filters();
                assert_eq!(filters.media_type.as_deref(), Some("tv"));
                assert_eq!(filters.genres, vec![1, 2]);
                assert_eq!(paging.pages, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_variant_flag() {
        let args = Args::try_parse_from(["anidex", "top", "--variant", "featured"]).unwrap();
        match args.command {
            Command::Top { variant, .. } => assert_eq!(variant, GridVariant::Featured),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Args::try_parse_from(["anidex", "top", "--variant", "huge"]).is_err());
    }

    #[test]
    fn test_grid_config_uses_the_fetchers_page_size() {
        let config = grid_config(GridVariant::Full, 10);
        assert_eq!(config.page_size, Some(10));

        let mut list = IncrementalResultList::<u32>::remote(config);
        let ticket = list.start().unwrap();
        list.complete(ticket, Ok(catalog_core::ResultPage::new(1, (0..10).collect())));
        assert!(list.has_next());

        let ticket = list.load_more().unwrap();
        list.complete(ticket, Ok(catalog_core::ResultPage::new(2, (10..14).collect())));
        assert!(!list.has_next());
    }

    #[test]
    fn test_random_args() {
        let args = Args::try_parse_from([
            "anidex", "random", "--type", "movie", "--genre", "22", "--status", "all", "--min-score", "12", "--rolls", "3",
        ])
        .unwrap();

        match args.command {
            Command::Random { preferences, rolls } => {
                assert_eq!(rolls, 3);
                let preferences = preferences.to_preferences();
                assert_eq!(preferences.media_type.as_deref(), Some("movie"));
                assert_eq!(preferences.genre, Some(22));
                assert_eq!(preferences.status, None);
                assert_eq!(preferences.min_score, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_filter_args_drop_invalid_values() {
        let filters = FilterArgs {
            sort: Some("sideways".to_string()),
            min_score: Some(11.0),
            start_year: Some(1999),
            ..FilterArgs::default()
        }
        .to_filters();

        assert_eq!(filters.sort, shared::SortDirection::Desc);
        assert_eq!(filters.min_score, None);
        assert_eq!(filters.start_year, Some(1999));
    }
}
