//! In-memory catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{RemoteCatalogClient, RemoteItem, RemoteResult};
use crate::error::FetchError;

/// Scripted catalog. Each query answers with a fixed response after an
/// optional delay; unscripted queries answer with `fallback`.
pub struct MockCatalog {
  responses: Mutex<HashMap<String, (Duration, Result<RemoteResult, FetchError>)>>,
  fallback: Result<RemoteResult, FetchError>,
  calls: AtomicUsize,
}

impl MockCatalog {
  /// Every query returns `items`.
  pub fn returning(items: Vec<RemoteItem>) -> Self {
    Self::with_fallback(Ok(result(items)))
  }

  /// Every query fails with `error`.
  pub fn failing(error: FetchError) -> Self {
    Self::with_fallback(Err(error))
  }

  fn with_fallback(fallback: Result<RemoteResult, FetchError>) -> Self {
    Self {
      responses: Mutex::new(HashMap::new()),
      fallback,
      calls: AtomicUsize::new(0),
    }
  }

  /// Script the answer for one query.
  pub fn respond(self, query: &str, delay: Duration, response: Result<RemoteResult, FetchError>) -> Self {
    self
      .responses
      .lock()
      .unwrap()
      .insert(query.to_string(), (delay, response));
    self
  }

  /// Number of searches performed so far.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RemoteCatalogClient for MockCatalog {
  async fn search(&self, query: &str) -> Result<RemoteResult, FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let scripted = self.responses.lock().unwrap().get(query).cloned();
    match scripted {
      Some((delay, response)) => {
        if !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
        response
      }
      None => self.fallback.clone(),
    }
  }
}

/// Wrap items in a result with a matching total.
pub fn result(items: Vec<RemoteItem>) -> RemoteResult {
  RemoteResult {
    total_items: items.len() as u64,
    items,
  }
}

/// A fully populated remote item.
pub fn item(id: &str, title: &str) -> RemoteItem {
  RemoteItem {
    id: id.to_string(),
    title: title.to_string(),
    authors: vec!["Test Author".to_string()],
    description: Some(format!("About {}", title)),
    thumbnail_url: Some(format!("http://books.example.com/{}.png", id)),
  }
}
