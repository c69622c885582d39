//! Query-driven search state machine.
//!
//! The controller turns raw user input into a single immutable
//! [`SearchState`] snapshot per transition and publishes it on a
//! `tokio::sync::watch` channel, so subscribers never see a half-updated
//! mix of loading flags, books and messages.
//!
//! ```text
//! Idle ──load──▶ Loading ──resolved──▶ Success | OfflineSuccess | Error
//!                   ▲                              │
//!                   └──────────────load────────────┘
//! ```
//!
//! Blank input is rejected before dispatch and leaves the state untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::books::{normalize, Book, BookRepository, BookResults};
use crate::error::QueryError;

/// Where a search currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// No search has been issued yet
  Idle,
  /// A search is in flight
  Loading,
  /// Live results from the catalog
  Success,
  /// Cached results served because the live fetch failed
  OfflineSuccess,
  /// Nothing to show; `message` says why
  Error,
}

/// One published snapshot of the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
  pub phase: Phase,
  /// Raw query as the user typed it
  pub query: String,
  pub books: Vec<Book>,
  pub message: Option<String>,
}

impl SearchState {
  pub fn idle() -> Self {
    Self {
      phase: Phase::Idle,
      query: String::new(),
      books: Vec::new(),
      message: None,
    }
  }

  fn loading(query: &str) -> Self {
    Self {
      phase: Phase::Loading,
      query: query.to_string(),
      books: Vec::new(),
      message: None,
    }
  }

  /// Map a repository outcome onto the terminal phase for `query`.
  fn resolved(query: &str, results: BookResults) -> Self {
    let diagnostic = results
      .failure
      .map(|f| f.to_string())
      .unwrap_or_else(|| "unknown error".to_string());

    let (phase, message) = match (results.offline, results.books.is_empty()) {
      (false, false) => (Phase::Success, None),
      (false, true) => (Phase::Error, Some(format!("No books found for '{}'", query))),
      (true, false) => (
        Phase::OfflineSuccess,
        Some(format!("Showing cached results. {}", diagnostic)),
      ),
      (true, true) => (
        Phase::Error,
        Some(format!("Failed to load books: {}", diagnostic)),
      ),
    };

    Self {
      phase,
      query: query.to_string(),
      books: results.books,
      message,
    }
  }
}

impl Default for SearchState {
  fn default() -> Self {
    Self::idle()
  }
}

/// Which completed request gets to publish its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultOrdering {
  /// Whichever request finishes last wins, even if it was issued first.
  #[default]
  LastCompleted,
  /// Only the most recently issued request may publish; older results are
  /// dropped when they arrive.
  LatestIssued,
}

/// A request that has passed validation and published `Loading`.
struct Ticket {
  generation: u64,
  raw: String,
  normalized: String,
}

/// Drives [`SearchState`] transitions for a presentation layer.
///
/// Cloning is cheap; clones share the repository, the published state and
/// the request counter.
#[derive(Clone)]
pub struct SearchController {
  repository: Arc<BookRepository>,
  state: Arc<watch::Sender<SearchState>>,
  generation: Arc<AtomicU64>,
  ordering: ResultOrdering,
}

impl SearchController {
  pub fn new(repository: Arc<BookRepository>) -> Self {
    let (tx, _rx) = watch::channel(SearchState::idle());
    Self {
      repository,
      state: Arc::new(tx),
      generation: Arc::new(AtomicU64::new(0)),
      ordering: ResultOrdering::default(),
    }
  }

  pub fn with_ordering(mut self, ordering: ResultOrdering) -> Self {
    self.ordering = ordering;
    self
  }

  /// Receive every published snapshot.
  pub fn subscribe(&self) -> watch::Receiver<SearchState> {
    self.state.subscribe()
  }

  /// Current snapshot.
  pub fn state(&self) -> SearchState {
    self.state.borrow().clone()
  }

  /// Search for `raw_query` and wait until its result has been applied.
  pub async fn load_books(&self, raw_query: &str) -> Result<(), QueryError> {
    let ticket = self.begin(raw_query)?;
    self.resolve(ticket).await;
    Ok(())
  }

  /// Start a search in the background and return immediately. `Loading` is
  /// already published when this returns.
  pub fn dispatch(&self, raw_query: &str) -> Result<JoinHandle<()>, QueryError> {
    let ticket = self.begin(raw_query)?;
    let controller = self.clone();
    Ok(tokio::spawn(async move { controller.resolve(ticket).await }))
  }

  fn begin(&self, raw_query: &str) -> Result<Ticket, QueryError> {
    let normalized = normalize(raw_query).inspect_err(|_| {
      debug!("Ignoring blank query");
    })?;
    // Bump and publish under the watch lock so `resolve` sees both or neither
    let mut generation = 0;
    self.state.send_modify(|state| {
      generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
      *state = SearchState::loading(raw_query);
    });
    debug!(query = raw_query, %normalized, generation, "Loading books");

    Ok(Ticket {
      generation,
      raw: raw_query.to_string(),
      normalized,
    })
  }

  async fn resolve(&self, ticket: Ticket) {
    let results = self.repository.get_books(&ticket.normalized).await;
    let next = SearchState::resolved(&ticket.raw, results);
    let (phase, count) = (next.phase, next.books.len());

    let applied = self.state.send_if_modified(|state| {
      if self.ordering == ResultOrdering::LatestIssued
        && self.generation.load(Ordering::SeqCst) != ticket.generation
      {
        return false;
      }
      *state = next;
      true
    });

    if applied {
      info!(query = %ticket.raw, ?phase, count, "Search resolved");
    } else {
      debug!(
        query = %ticket.raw,
        generation = ticket.generation,
        "Discarding result of superseded request"
      );
    }
  }
}
