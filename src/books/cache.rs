//! Conversions between books and cache rows.

use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;

use super::types::Book;

impl Book {
  /// Wrap this book as a cache row under `search_query`.
  pub fn to_entry(&self, search_query: &str, cached_at: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
      book: self.clone(),
      search_query: search_query.to_string(),
      cached_at,
    }
  }
}

impl From<CacheEntry> for Book {
  fn from(entry: CacheEntry) -> Self {
    entry.book
  }
}

/// Stamp a freshly fetched result set for a single write-through.
pub fn entries_for_query(books: &[Book], search_query: &str) -> Vec<CacheEntry> {
  let cached_at = Utc::now();
  books
    .iter()
    .map(|book| book.to_entry(search_query, cached_at))
    .collect()
}
