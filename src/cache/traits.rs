//! Core types for the book cache.

use chrono::{DateTime, Utc};

use crate::books::Book;

/// A book persisted under the normalized query that fetched it.
///
/// Rows are keyed by `book.id` across the whole store and grouped by
/// `search_query`; a group is only ever replaced as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
  pub book: Book,
  /// Normalized query the row was cached under
  pub search_query: String,
  /// When the row was written
  pub cached_at: DateTime<Utc>,
}
