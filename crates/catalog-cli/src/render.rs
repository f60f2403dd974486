//! Plain-text rendering of grids, the search dropdown and detail pages.

use catalog_core::grid::{Breakpoint, CardVariant, Gap};
use catalog_core::{DetailPage, DropdownView, IncrementalResultList, ListStatus, Route, Section};
use shared::{
    format_duration, format_score, AnimeDetail, AnimeSummary, CharacterRole, Episode, Genre,
    MangaDetail, MangaSummary, Record, Review,
};
use std::fmt::Write;

/// Approximate width of one terminal cell in pixels
const CELL_PX: u32 = 8;

/// Characters of review text shown before it is cut
const REVIEW_PREVIEW: usize = 400;

/// A record that can be drawn as a card
pub trait Card: Record {
    /// Short facts under the title ("★ 8.7", "TV", "64 episodes")
    fn facts(&self) -> Vec<String>;

    fn status(&self) -> Option<&str>;
}

impl Card for AnimeSummary {
    fn facts(&self) -> Vec<String> {
        let mut facts = vec![format!("★ {}", format_score(self.score))];
        if let Some(kind) = &self.anime_type {
            facts.push(kind.clone());
        }
        if let Some(episodes) = self.episodes {
            facts.push(format!("{} episodes", episodes));
        }
        if let Some(year) = self.year {
            facts.push(year.to_string());
        }
        facts
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl Card for MangaSummary {
    fn facts(&self) -> Vec<String> {
        let mut facts = vec![format!("★ {}", format_score(self.score))];
        if let Some(kind) = &self.manga_type {
            facts.push(kind.clone());
        }
        if let Some(chapters) = self.chapters {
            facts.push(format!("{} chapters", chapters));
        }
        if let Some(year) = self.year {
            facts.push(year.to_string());
        }
        facts
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

fn card_lines<T: Card>(item: &T, variant: CardVariant) -> Vec<String> {
    let title = item.title().to_string();
    match variant {
        CardVariant::Minimal => vec![title],
        CardVariant::Compact => {
            let facts = item.facts();
            vec![title, facts.into_iter().take(2).collect::<Vec<_>>().join(" · ")]
        }
        CardVariant::Default => {
            let mut lines = vec![title, item.facts().join(" · ")];
            if let Some(status) = item.status() {
                lines.push(status.to_string());
            }
            lines
        }
    }
}

/// Truncate or pad to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        if width > 0 {
            cut.push('…');
        }
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn gap_width(gap: Gap) -> usize {
    match gap {
        Gap::Sm => 1,
        Gap::Md => 2,
        Gap::Lg => 4,
    }
}

/// Lay cards out in rows of the column count for `width_px`
pub fn cards<T: Card>(list: &IncrementalResultList<T>, width_px: u32) -> String {
    let config = list.config();
    let items = list.items();
    let columns = config.columns.at(Breakpoint::from_width(width_px)) as usize;
    let gap = gap_width(config.gap);
    let total = (width_px / CELL_PX) as usize;
    let cell = (total.saturating_sub(gap * (columns - 1)) / columns).max(8);

    let mut out = String::new();
    for row in items.chunks(columns) {
        let blocks: Vec<Vec<String>> = row.iter().map(|item| card_lines(item, config.card)).collect();
        let height = blocks.iter().map(Vec::len).max().unwrap_or(0);

        for line in 0..height {
            let cells: Vec<String> = blocks
                .iter()
                .map(|block| fit(block.get(line).map(String::as_str).unwrap_or(""), cell))
                .collect();
            let _ = writeln!(out, "{}", cells.join(&" ".repeat(gap)).trim_end());
        }
        out.push('\n');
    }
    out
}

/// Render a result grid in whatever state it is in
pub fn grid<T: Card>(list: &IncrementalResultList<T>, width_px: u32, noun: &str) -> String {
    let mut out = String::new();

    match list.status() {
        ListStatus::Idle | ListStatus::Loading => {
            let _ = writeln!(out, "Loading {}...", noun);
        }
        ListStatus::Failed => {
            let message = list.error().map(|e| e.message).unwrap_or_default();
            let _ = writeln!(out, "! {}", message);
            let _ = writeln!(out, "  [Retry] run again with --retry");
        }
        ListStatus::Empty => {
            let _ = writeln!(out, "No {} found", noun);
        }
        ListStatus::Ready => {
            if let Some(stats) = list.stats(noun) {
                let _ = writeln!(out, "{}\n", stats);
            }
            out.push_str(&cards(list, width_px));

            if let Some(error) = list.error() {
                let _ = writeln!(out, "! {}", error.message);
            }
            if list.is_loading_more() {
                let _ = writeln!(out, "Loading more...");
            } else if list.show_load_more() {
                let _ = writeln!(out, "[Load more] use --pages {}", list.page() + 1);
            }
        }
    }

    out
}

/// Render the dropdown under the live search box
pub fn dropdown<T: Card>(view: &DropdownView<'_, T>) -> String {
    let mut out = String::new();

    match view {
        DropdownView::Hidden => {}
        DropdownView::Trending(terms) => {
            let _ = writeln!(out, "Trending searches");
            for (i, term) in terms.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, term);
            }
        }
        DropdownView::Loading => {
            let _ = writeln!(out, "Searching...");
        }
        DropdownView::Results {
            items,
            selected,
            view_all,
        } => {
            for (i, item) in items.iter().enumerate() {
                let marker = if *selected == Some(i) { '>' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{} {}. {}  ({})",
                    marker,
                    i + 1,
                    item.title(),
                    item.facts().join(" · ")
                );
            }
            if let Some(route) = view_all {
                let _ = writeln!(out, "  View all results -> {}", route);
            }
        }
        DropdownView::NoResults { query, search } => {
            let _ = writeln!(out, "No results found for \"{}\"", query);
            let _ = writeln!(out, "  Search anyway -> {}", search);
        }
        DropdownView::Error { message } => {
            let _ = writeln!(out, "! {}", message);
        }
    }

    out
}

fn push_list(out: &mut String, label: &str, values: &[String]) {
    if !values.is_empty() {
        let _ = writeln!(out, "{}: {}", label, values.join(", "));
    }
}

fn push_opt<D: std::fmt::Display>(out: &mut String, label: &str, value: Option<D>) {
    if let Some(value) = value {
        let _ = writeln!(out, "{}: {}", label, value);
    }
}

pub fn anime_detail(detail: &AnimeDetail) -> String {
    let s = &detail.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", s.title);
    push_opt(&mut out, "English", s.title_english.as_deref());
    push_opt(&mut out, "Japanese", detail.title_japanese.as_deref());
    let _ = writeln!(out, "{}", s.facts().join(" · "));
    push_opt(&mut out, "Status", s.status.as_deref());
    push_opt(&mut out, "Rank", s.rank.map(|r| format!("#{}", r)));
    push_opt(&mut out, "Popularity", detail.popularity.map(|p| format!("#{}", p)));
    push_opt(&mut out, "Members", detail.members);
    push_opt(&mut out, "Scored by", detail.scored_by);
    push_opt(&mut out, "Season", detail.season.as_deref());
    push_opt(&mut out, "Broadcast", detail.broadcast.as_deref());
    push_opt(&mut out, "Source", detail.source.as_deref());
    push_opt(&mut out, "Duration", detail.duration.as_deref().map(format_duration));
    push_opt(&mut out, "Rating", detail.rating.as_deref());
    push_list(&mut out, "Studios", &detail.studios);
    push_list(&mut out, "Genres", &detail.genres);
    push_list(&mut out, "Themes", &detail.themes);
    push_opt(&mut out, "Trailer", detail.trailer_url.as_deref());

    if let Some(synopsis) = &detail.synopsis {
        let _ = writeln!(out, "\n{}", synopsis);
    }
    out
}

pub fn manga_detail(detail: &MangaDetail) -> String {
    let s = &detail.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", s.title);
    push_opt(&mut out, "English", s.title_english.as_deref());
    push_opt(&mut out, "Japanese", detail.title_japanese.as_deref());
    let _ = writeln!(out, "{}", s.facts().join(" · "));
    push_opt(&mut out, "Status", s.status.as_deref());
    push_opt(&mut out, "Volumes", s.volumes);
    push_opt(&mut out, "Rank", s.rank.map(|r| format!("#{}", r)));
    push_opt(&mut out, "Popularity", detail.popularity.map(|p| format!("#{}", p)));
    push_opt(&mut out, "Members", detail.members);
    push_opt(&mut out, "Scored by", detail.scored_by);
    push_list(&mut out, "Authors", &detail.authors);
    push_list(&mut out, "Serializations", &detail.serializations);
    push_list(&mut out, "Genres", &detail.genres);
    push_list(&mut out, "Themes", &detail.themes);

    if let Some(synopsis) = &detail.synopsis {
        let _ = writeln!(out, "\n{}", synopsis);
    }
    out
}

/// Heading plus the section body, or its error in place of the body
fn push_section<T>(out: &mut String, title: &str, section: &Section<T>, body: impl FnOnce(&mut String, &T)) {
    let _ = writeln!(out, "\n== {} ==", title);
    match section {
        Section::Loaded(value) => body(out, value),
        Section::Failed(e) => {
            let _ = writeln!(out, "! {}", e.message);
        }
    }
}

fn push_characters(out: &mut String, characters: &[CharacterRole]) {
    if characters.is_empty() {
        let _ = writeln!(out, "Character information not available");
    }
    for character in characters {
        let _ = write!(out, "  {} · {}", character.name, character.role);
        if let Some(actor) = character.voice_actors.first() {
            let _ = write!(out, " · {}", actor);
        }
        out.push('\n');
    }
}

fn push_episodes(out: &mut String, episodes: &[Episode]) {
    if episodes.is_empty() {
        let _ = writeln!(out, "Episode information not available");
    }
    for episode in episodes {
        let title = episode.title.as_deref().unwrap_or("Untitled");
        let _ = write!(out, "  Episode {}: {}", episode.number, title);
        if let Some(aired) = &episode.aired {
            let _ = write!(out, " ({})", aired);
        }
        if episode.filler {
            out.push_str(" [filler]");
        }
        if episode.recap {
            out.push_str(" [recap]");
        }
        out.push('\n');
    }
}

fn push_reviews(out: &mut String, reviews: &[Review]) {
    if reviews.is_empty() {
        let _ = writeln!(out, "No reviews available");
    }
    for review in reviews {
        let score = review.score.map_or_else(|| "N/A".to_string(), |s| s.to_string());
        let _ = write!(out, "  {} · Score: {}", review.username, score);
        if let Some(date) = &review.date {
            let _ = write!(out, " · {}", date);
        }
        out.push('\n');

        if review.is_spoiler {
            let _ = writeln!(out, "    (contains spoilers)");
            continue;
        }
        let text = review.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview = if text.chars().count() > REVIEW_PREVIEW {
            fit(&text, REVIEW_PREVIEW)
        } else {
            text
        };
        let _ = writeln!(out, "    {}", preview);
    }
}

fn push_sections<D, R: Card>(out: &mut String, page: &DetailPage<D, R>, width_px: u32) {
    if let Some(episodes) = &page.episodes {
        push_section(out, "Episodes", episodes, |out, e| push_episodes(out, e));
    }
    push_section(out, "Characters", &page.characters, |out, c| push_characters(out, c));

    // An empty recommendation list is left out entirely
    let empty = page.recommendations.loaded().is_some_and(|list| list.items().is_empty());
    if !empty {
        push_section(out, "Recommendations", &page.recommendations, |out, list| {
            out.push_str(&cards(list, width_px));
        });
    }
    push_section(out, "Reviews", &page.reviews, |out, r| push_reviews(out, r));
}

pub fn anime_page(page: &DetailPage<AnimeDetail, AnimeSummary>, width_px: u32) -> String {
    let mut out = anime_detail(&page.detail);
    push_sections(&mut out, page, width_px);
    out
}

pub fn manga_page(page: &DetailPage<MangaDetail, MangaSummary>, width_px: u32) -> String {
    let mut out = manga_detail(&page.detail);
    push_sections(&mut out, page, width_px);
    out
}

/// A random pick, with the link to its detail page
pub fn pick<T: Card>(item: &T) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", item.title());
    let _ = writeln!(out, "{}", item.facts().join(" · "));
    if let Some(status) = item.status() {
        let _ = writeln!(out, "{}", status);
    }
    let _ = writeln!(out, "View details -> {}", Route::for_record(item));
    out
}

pub fn genres(genres: &[Genre]) -> String {
    let mut sorted: Vec<&Genre> = genres.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let mut out = String::new();
    for genre in sorted {
        let _ = writeln!(out, "{:>4}  {:<24} {}", genre.mal_id, genre.name, genre.count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::grid::{GridOptions, GridVariant};
    use catalog_core::{Key, LiveSearch, ResultPage, SearchSettings};
    use tokio::time::Instant;

    fn anime(id: u32, title: &str, score: Option<f64>) -> AnimeSummary {
        AnimeSummary {
            mal_id: id,
            title: title.to_string(),
            title_english: None,
            anime_type: Some("TV".to_string()),
            episodes: Some(12),
            status: Some("Finished Airing".to_string()),
            airing: false,
            score,
            rank: None,
            year: Some(2020),
            image_url: None,
        }
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }

    #[test]
    fn test_grid_rows_follow_breakpoint() {
        let items: Vec<AnimeSummary> = (1..=6).map(|i| anime(i, &format!("Show {}", i), Some(7.5))).collect();
        let config = GridOptions::variant(GridVariant::Minimalist).resolve();
        let list = IncrementalResultList::from_items(items, config);

        // 700px is the Sm breakpoint: three columns, one line per minimal card
        let out = cards(&list, 700);
        let rows: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Show 1") && rows[0].contains("Show 3"));
        assert!(rows[1].starts_with("Show 4"));
    }

    #[test]
    fn test_grid_states() {
        let mut list = IncrementalResultList::<AnimeSummary>::remote(GridOptions::default().resolve());
        assert!(grid(&list, 1280, "anime").starts_with("Loading anime"));

        let ticket = list.start().unwrap();
        list.complete(ticket, Err(anyhow::anyhow!("502")));
        let out = grid(&list, 1280, "anime");
        assert!(out.contains("Failed to load data"));
        assert!(out.contains("Retry"));
        assert!(!out.contains("502"));

        let ticket = list.retry().unwrap();
        list.complete(
            ticket,
            Ok(ResultPage::new(1, vec![anime(1, "Frieren", Some(9.3))]).with_next(true).with_total(30)),
        );
        let out = grid(&list, 1280, "anime");
        assert!(out.starts_with("Showing 1 of 30 anime"));
        assert!(out.contains("★ 9.3 · TV · 12 episodes"));
        assert!(out.contains("[Load more]"));
    }

    #[test]
    fn test_dropdown_marks_selection() {
        let mut search = LiveSearch::new(SearchSettings::default());
        let t0 = Instant::now();
        search.input("fri", t0);
        let ticket = search.poll(t0 + std::time::Duration::from_millis(300)).unwrap();
        search.complete(
            &ticket,
            Ok(ResultPage::new(1, vec![anime(1, "Frieren", None), anime(2, "Fruits Basket", None)])),
        );
        search.key(Key::ArrowDown);

        let out = dropdown(&search.view());
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("> 1. Frieren"));
        assert!(lines[0].contains("★ N/A"));
        assert!(lines[1].starts_with("  2. Fruits Basket"));
    }

    #[test]
    fn test_dropdown_no_results_offers_search() {
        let view: DropdownView<'_, AnimeSummary> = DropdownView::NoResults {
            query: "zzz top",
            search: catalog_core::Route::search("zzz top"),
        };
        assert!(dropdown(&view).contains("Search anyway -> /search?q=zzz%20top"));
    }

    fn anime_page_with(reviews: Section<Vec<Review>>) -> DetailPage<AnimeDetail, AnimeSummary> {
        let detail = AnimeDetail {
            summary: anime(5114, "Fullmetal Alchemist: Brotherhood", Some(9.1)),
            title_japanese: None,
            source: None,
            duration: None,
            rating: None,
            season: None,
            scored_by: None,
            popularity: None,
            members: None,
            synopsis: None,
            genres: Vec::new(),
            themes: Vec::new(),
            studios: Vec::new(),
            trailer_url: None,
            broadcast: None,
        };
        let grid = catalog_core::detail::recommendation_grid().resolve();
        DetailPage {
            detail,
            characters: Section::Loaded(vec![CharacterRole {
                mal_id: 11,
                name: "Elric, Edward".to_string(),
                role: "Main".to_string(),
                image_url: None,
                voice_actors: vec!["Park, Romi (Japanese)".to_string()],
            }]),
            episodes: Some(Section::Loaded(Vec::new())),
            recommendations: Section::Loaded(IncrementalResultList::from_items(
                vec![AnimeSummary::linked(121, "Fullmetal Alchemist", None)],
                grid,
            )),
            reviews,
        }
    }

    #[test]
    fn test_detail_page_shows_failed_section_in_place() {
        let cause = anyhow::anyhow!("HTTP 503 from /reviews");
        let reviews = Section::Failed(catalog_core::ControllerError::new(
            catalog_core::error::SECTION_FAILED,
            cause,
        ));
        let out = anime_page(&anime_page_with(reviews), 1280);

        assert!(out.starts_with("Fullmetal Alchemist: Brotherhood"));
        assert!(out.contains("Episode information not available"));
        assert!(out.contains("Elric, Edward · Main · Park, Romi (Japanese)"));
        assert!(out.contains("== Recommendations ==\nFullmetal"));
        assert!(out.contains("== Reviews ==\n! Not available right now"));
        assert!(!out.contains("503"));
    }

    #[test]
    fn test_reviews_are_previewed() {
        let review = Review {
            mal_id: 1,
            username: "reader".to_string(),
            score: Some(10),
            date: Some("May 1, 2010".to_string()),
            text: "word ".repeat(200),
            tags: Vec::new(),
            is_spoiler: false,
        };
        let spoiler = Review {
            is_spoiler: true,
            ..review.clone()
        };
        let out = anime_page(&anime_page_with(Section::Loaded(vec![review, spoiler])), 1280);

        assert!(out.contains("reader · Score: 10 · May 1, 2010"));
        assert!(out.contains("…"));
        assert!(out.contains("(contains spoilers)"));
    }

    #[test]
    fn test_pick_links_to_detail() {
        let out = pick(&anime(20, "Naruto", Some(8.0)));
        assert!(out.starts_with("Naruto\n★ 8.0"));
        assert!(out.ends_with("View details -> /anime/20\n"));
    }

    #[test]
    fn test_genres_sorted_by_count() {
        let list = vec![
            Genre { mal_id: 1, name: "Action".to_string(), count: 10 },
            Genre { mal_id: 4, name: "Comedy".to_string(), count: 20 },
        ];
        let out = genres(&list);
        assert!(out.lines().next().unwrap().contains("Comedy"));
    }
}
