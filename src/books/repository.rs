//! Book lookups backed by the remote catalog with a write-through cache.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStorage};
use crate::catalog::RemoteCatalogClient;
use crate::connectivity::ConnectivityProbe;
use crate::error::FetchError;

use super::cache::entries_for_query;
use super::types::Book;

/// Outcome of a lookup.
///
/// `offline` is the only signal callers need to branch on: it says the books
/// came from the cache. `failure` carries the reason the live fetch did not
/// happen, for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookResults {
  pub books: Vec<Book>,
  pub offline: bool,
  pub failure: Option<FetchError>,
}

impl BookResults {
  fn online(books: Vec<Book>) -> Self {
    Self {
      books,
      offline: false,
      failure: None,
    }
  }

  fn from_cache(books: Vec<Book>, failure: FetchError) -> Self {
    Self {
      books,
      offline: true,
      failure: Some(failure),
    }
  }
}

/// Resolves normalized queries into books.
///
/// Prefers the live catalog and writes every non-empty result through to the
/// cache; when the network is down or the fetch fails for any reason, serves
/// whatever the cache holds for the query.
pub struct BookRepository {
  remote: Arc<dyn RemoteCatalogClient>,
  cache: Arc<dyn CacheStorage>,
  probe: Arc<dyn ConnectivityProbe>,
}

impl BookRepository {
  pub fn new(
    remote: Arc<dyn RemoteCatalogClient>,
    cache: Arc<dyn CacheStorage>,
    probe: Arc<dyn ConnectivityProbe>,
  ) -> Self {
    Self {
      remote,
      cache,
      probe,
    }
  }

  /// Look up books for an already normalized query. Never fails: every
  /// fetch failure falls back to the cache.
  pub async fn get_books(&self, query: &str) -> BookResults {
    debug!(query, "Getting books");

    match self.fetch_remote(query).await {
      Ok(books) => {
        if books.is_empty() {
          // Nothing to write through; keep any earlier rows for this query
          info!(query, "Catalog returned no books");
        } else {
          self.write_through(query, &books).await;
        }
        BookResults::online(books)
      }
      Err(failure) => {
        warn!(query, kind = failure.kind(), "Live fetch failed: {}", failure);
        let books = self.load_from_cache(query).await;
        info!(query, count = books.len(), "Serving cached books");
        BookResults::from_cache(books, failure)
      }
    }
  }

  /// Most recently cached books across every query.
  pub async fn recent_books(&self, limit: usize) -> Result<Vec<Book>> {
    let cache = Arc::clone(&self.cache);
    let entries = tokio::task::spawn_blocking(move || cache.recent(limit))
      .await
      .map_err(|e| eyre!("Cache task failed: {}", e))??;

    Ok(entries.into_iter().map(Book::from).collect())
  }

  async fn fetch_remote(&self, query: &str) -> Result<Vec<Book>, FetchError> {
    if !self.probe.is_available().await {
      return Err(FetchError::ConnectivityUnavailable);
    }

    let result = self.remote.search(query).await?;
    debug!(
      query,
      total_items = result.total_items,
      received = result.items.len(),
      "Catalog search complete"
    );

    Ok(result.items.into_iter().map(Book::from_remote).collect())
  }

  /// Replace the cached group for `query`. Failures are logged; the fetched
  /// books are still returned to the caller.
  async fn write_through(&self, query: &str, books: &[Book]) {
    let entries = entries_for_query(books, query);
    let count = entries.len();
    let cache = Arc::clone(&self.cache);
    let key = query.to_string();

    let outcome = tokio::task::spawn_blocking(move || cache.replace_query(&key, &entries))
      .await
      .map_err(|e| eyre!("Cache task failed: {}", e))
      .and_then(|r| r);

    match outcome {
      Ok(()) => debug!(query, count, "Cached books"),
      Err(e) => warn!(query, "Failed to cache books: {}", e),
    }
  }

  /// Cached books for `query`. A read failure counts as an empty cache.
  async fn load_from_cache(&self, query: &str) -> Vec<Book> {
    let cache = Arc::clone(&self.cache);
    let key = query.to_string();

    let outcome: Result<Vec<CacheEntry>> =
      tokio::task::spawn_blocking(move || cache.get_by_query(&key))
        .await
        .map_err(|e| eyre!("Cache task failed: {}", e))
        .and_then(|r| r);

    match outcome {
      Ok(entries) => entries.into_iter().map(Book::from).collect(),
      Err(e) => {
        warn!(query, "Failed to read cache: {}", e);
        Vec::new()
      }
    }
  }
}
