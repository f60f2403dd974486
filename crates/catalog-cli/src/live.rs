//! Interactive live search on stdin.
//!
//! Every line typed replaces the contents of the search box. Lines starting
//! with `:` are keys and clicks instead (`:down`, `:pick 2`, `:quit`, ...).

use crate::render::{self, Card};
use anyhow::{Context, Result};
use catalog_core::{Key, Route, SearchEvent, SearchSession, SearchSettings, SearchSource};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(SearchEvent),
    Quit,
    Help,
    Unknown(String),
}

pub const HELP: &str = "\
Type to search. Commands:
  :down :up      move the selection
  :enter         open the selection, or search for the typed text
  :esc           close the dropdown
  :submit        search for the typed text
  :pick N        open result N
  :trend N       search for trending term N
  :focus         focus the search box
  :outside       click outside the search box
  :quit          leave";

/// 1-based position typed by the user, as an index
fn position(arg: Option<&str>) -> Option<usize> {
    arg?.trim().parse::<usize>().ok()?.checked_sub(1)
}

pub fn parse_command(line: &str) -> Command {
    let Some(command) = line.strip_prefix(':') else {
        return Command::Event(SearchEvent::Input(line.to_string()));
    };

    let mut parts = command.trim().splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let event = match name {
        "down" => SearchEvent::Key(Key::ArrowDown),
        "up" => SearchEvent::Key(Key::ArrowUp),
        "enter" => SearchEvent::Key(Key::Enter),
        "esc" => SearchEvent::Key(Key::Escape),
        "submit" => SearchEvent::Submit,
        "focus" => SearchEvent::Focus,
        "outside" => SearchEvent::ClickOutside,
        "pick" => match position(arg) {
            Some(index) => SearchEvent::Select(index),
            None => return Command::Unknown(line.to_string()),
        },
        "trend" => match position(arg) {
            Some(index) => SearchEvent::PickTrending(index),
            None => return Command::Unknown(line.to_string()),
        },
        "quit" | "q" => return Command::Quit,
        "help" | "h" => return Command::Help,
        _ => return Command::Unknown(line.to_string()),
    };

    Command::Event(event)
}

/// Run a live search session until `:quit` or end of input. Each navigation
/// is handed to `open`.
pub async fn run<T, F, Fut>(
    source: Arc<dyn SearchSource<T>>,
    settings: SearchSettings,
    open: F,
) -> Result<()>
where
    T: Card + Clone + Send + Sync + 'static,
    F: Fn(Route) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut session = SearchSession::spawn(source, settings);
    let mut state = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = String::new();

    info!("Live search started");
    println!("{}", HELP);
    session.send(SearchEvent::Focus);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Command::Event(event) => {
                        session.send(event);
                    }
                    Command::Quit => break,
                    Command::Help => println!("{}", HELP),
                    Command::Unknown(text) => println!("Unknown command: {} (try :help)", text),
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = {
                    let search = state.borrow_and_update();
                    let dropdown = render::dropdown(&search.view());
                    format!("[{}] {:?}\n{}", search.raw_query(), search.status(), dropdown)
                };
                if view != shown {
                    println!("{}", view);
                    shown = view;
                }
            }
            route = session.next_navigation() => {
                let Some(route) = route else {
                    break;
                };
                println!("-> {}", route);
                if let Err(e) = open(route).await {
                    warn!(error = %format!("{:#}", e), "Failed to open route");
                    println!("! {:#}", e);
                }
            }
        }
    }

    info!("Live search finished");
    Ok(())
}
