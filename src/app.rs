use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use crate::books::{Book, BookRepository};
use crate::cache::{CacheStorage, NoopStorage, SqliteStorage};
use crate::catalog::HttpCatalogClient;
use crate::commands::{parse_input, CommandKind, Input, COMMANDS};
use crate::config::Config;
use crate::connectivity::{ConnectivityProbe, HttpProbe, StaticProbe};
use crate::controller::{Phase, ResultOrdering, SearchController, SearchState};
use crate::error::QueryError;
use crate::event::{Event, EventHandler};

/// Wire the catalog client, cache and connectivity probe from configuration.
pub fn build_repository(config: &Config, offline: bool) -> Result<BookRepository> {
  let remote = HttpCatalogClient::new(&config.catalog)?;

  let cache: Arc<dyn CacheStorage> = if config.cache.enabled {
    Arc::new(SqliteStorage::open(config.cache.path.as_deref())?)
  } else {
    info!("Cache disabled");
    Arc::new(NoopStorage)
  };

  let probe: Arc<dyn ConnectivityProbe> = if offline {
    info!("Offline mode forced, catalog will not be contacted");
    Arc::new(StaticProbe::offline())
  } else {
    Arc::new(HttpProbe::new(
      config.catalog.probe_url(),
      config.catalog.probe_timeout(),
    )?)
  };

  Ok(BookRepository::new(Arc::new(remote), cache, probe))
}

/// Main application state
pub struct App<W: Write> {
  controller: SearchController,
  repository: Arc<BookRepository>,
  recent_limit: usize,
  out: W,
  should_quit: bool,
}

impl App<std::io::Stdout> {
  pub fn new(config: &Config, offline: bool) -> Result<Self> {
    let repository = Arc::new(build_repository(config, offline)?);
    let ordering = if config.search.discard_stale {
      ResultOrdering::LatestIssued
    } else {
      ResultOrdering::LastCompleted
    };
    let controller = SearchController::new(Arc::clone(&repository)).with_ordering(ordering);

    Ok(Self::from_parts(
      controller,
      repository,
      config.search.recent_limit,
      std::io::stdout(),
    ))
  }
}

impl<W: Write> App<W> {
  pub fn from_parts(
    controller: SearchController,
    repository: Arc<BookRepository>,
    recent_limit: usize,
    out: W,
  ) -> Self {
    Self {
      controller,
      repository,
      recent_limit,
      out,
      should_quit: false,
    }
  }

  /// Resolve a single query and print the final state.
  pub async fn run_once(&mut self, query: &str) -> Result<Phase> {
    self
      .controller
      .load_books(query)
      .await
      .map_err(|e| eyre!("Cannot search: {}", e))?;

    let state = self.controller.state();
    render_state(&mut self.out, &state)?;
    Ok(state.phase)
  }

  /// Interactive prompt. Searches run in the background; snapshots are
  /// printed as the controller publishes them.
  pub async fn run(&mut self, initial_query: Option<&str>) -> Result<()> {
    let events = EventHandler::new(self.controller.subscribe());
    self.run_with(events, initial_query).await
  }

  async fn run_with(&mut self, mut events: EventHandler, initial_query: Option<&str>) -> Result<()> {
    writeln!(self.out, "Type a search, or :help for commands.")?;

    if let Some(query) = initial_query {
      self.search(query)?;
    }

    while !self.should_quit {
      match events.next().await {
        Some(Event::Line(line)) => self.handle_line(&line).await?,
        Some(Event::State(state)) => render_state(&mut self.out, &state)?,
        Some(Event::Eof) | None => break,
      }
      self.out.flush()?;
    }

    Ok(())
  }

  async fn handle_line(&mut self, line: &str) -> Result<()> {
    match parse_input(line) {
      Input::Search(query) => self.search(query)?,
      Input::Command(CommandKind::Recent) => self.show_recent().await?,
      Input::Command(CommandKind::Help) => {
        for cmd in COMMANDS {
          writeln!(
            self.out,
            "  :{:<8} {} (aliases: {})",
            cmd.name,
            cmd.description,
            cmd.aliases.join(", ")
          )?;
        }
      }
      Input::Command(CommandKind::Quit) => {
        self.should_quit = true;
      }
      Input::Unknown(name) => {
        writeln!(self.out, "Unknown command ':{}'. Try :help", name)?;
      }
    }
    Ok(())
  }

  fn search(&mut self, query: &str) -> Result<()> {
    match self.controller.dispatch(query) {
      // The task publishes its own result; nothing to wait for here
      Ok(_handle) => {}
      Err(QueryError::Empty) => debug!("Blank input ignored"),
    }
    Ok(())
  }

  async fn show_recent(&mut self) -> Result<()> {
    let books = self.repository.recent_books(self.recent_limit).await?;
    if books.is_empty() {
      writeln!(self.out, "Cache is empty.")?;
    } else {
      writeln!(self.out, "Recently cached:")?;
      render_books(&mut self.out, &books)?;
    }
    Ok(())
  }
}

/// Print one snapshot.
pub fn render_state(out: &mut impl Write, state: &SearchState) -> std::io::Result<()> {
  match state.phase {
    Phase::Idle => {}
    Phase::Loading => writeln!(out, "Searching for '{}'...", state.query)?,
    Phase::Success => {
      writeln!(out, "{} books for '{}':", state.books.len(), state.query)?;
      render_books(out, &state.books)?;
    }
    Phase::OfflineSuccess => {
      writeln!(out, "[offline] {}", state.message.as_deref().unwrap_or_default())?;
      render_books(out, &state.books)?;
    }
    Phase::Error => {
      writeln!(out, "error: {}", state.message.as_deref().unwrap_or_default())?;
    }
  }
  Ok(())
}

fn render_books(out: &mut impl Write, books: &[Book]) -> std::io::Result<()> {
  for (i, book) in books.iter().enumerate() {
    writeln!(out, "{:>3}. {} by {} [{}]", i + 1, book.title, book.author, book.id)?;
  }
  Ok(())
}
