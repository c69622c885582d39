//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::CacheEntry;
use crate::books::Book;

/// Trait for cache storage backends.
///
/// All operations are synchronous to match rusqlite's API; async callers
/// should run them on a blocking thread.
pub trait CacheStorage: Send + Sync {
  /// Rows cached under `query`, most recent first.
  fn get_by_query(&self, query: &str) -> Result<Vec<CacheEntry>>;

  /// Remove every row cached under `query`.
  fn delete_by_query(&self, query: &str) -> Result<()>;

  /// Upsert rows by book id. A row already stored under another query is
  /// moved to the new one.
  fn insert_all(&self, entries: &[CacheEntry]) -> Result<()>;

  /// Swap the `query` group for `entries`. Backends with transactions
  /// override this so readers never observe a partial group.
  fn replace_query(&self, query: &str, entries: &[CacheEntry]) -> Result<()> {
    self.delete_by_query(query)?;
    self.insert_all(entries)
  }

  /// Most recently cached rows across all queries.
  fn recent(&self, limit: usize) -> Result<Vec<CacheEntry>>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get_by_query(&self, _query: &str) -> Result<Vec<CacheEntry>> {
    Ok(Vec::new()) // Always miss
  }

  fn delete_by_query(&self, _query: &str) -> Result<()> {
    Ok(())
  }

  fn insert_all(&self, _entries: &[CacheEntry]) -> Result<()> {
    Ok(()) // Discard
  }

  fn recent(&self, _limit: usize) -> Result<Vec<CacheEntry>> {
    Ok(Vec::new())
  }
}

/// SQLite-based cache storage implementation.
///
/// A single connection behind a mutex serializes every operation, and the
/// group replace runs in one transaction, so readers observe either the old
/// or the new rows for a query.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache at `path`, or at the default location when `None`.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("bookshelf").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    thumbnail_url TEXT,
    description TEXT NOT NULL,
    search_query TEXT NOT NULL,
    -- index within the remote result, keeps a group in catalog order
    position INTEGER NOT NULL,
    -- unix milliseconds
    cached_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_query ON books(search_query);
CREATE INDEX IF NOT EXISTS idx_books_cached_at ON books(cached_at);
"#;

const SELECT_COLUMNS: &str =
  "SELECT id, title, author, thumbnail_url, description, search_query, cached_at FROM books";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
  let cached_at: i64 = row.get(6)?;
  Ok(CacheEntry {
    book: Book {
      id: row.get(0)?,
      title: row.get(1)?,
      author: row.get(2)?,
      thumbnail_url: row.get(3)?,
      description: row.get(4)?,
    },
    search_query: row.get(5)?,
    cached_at: DateTime::<Utc>::from_timestamp_millis(cached_at).unwrap_or_default(),
  })
}

fn insert_entries(conn: &Connection, entries: &[CacheEntry]) -> Result<()> {
  let mut stmt = conn
    .prepare_cached(
      "INSERT OR REPLACE INTO books
         (id, title, author, thumbnail_url, description, search_query, position, cached_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .map_err(|e| eyre!("Failed to prepare insert: {}", e))?;

  for (position, entry) in entries.iter().enumerate() {
    stmt
      .execute(params![
        entry.book.id,
        entry.book.title,
        entry.book.author,
        entry.book.thumbnail_url,
        entry.book.description,
        entry.search_query,
        position as i64,
        entry.cached_at.timestamp_millis(),
      ])
      .map_err(|e| eyre!("Failed to store book {}: {}", entry.book.id, e))?;
  }

  Ok(())
}

impl CacheStorage for SqliteStorage {
  fn get_by_query(&self, query: &str) -> Result<Vec<CacheEntry>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare_cached(&format!(
        "{SELECT_COLUMNS} WHERE search_query = ? ORDER BY cached_at DESC, position ASC"
      ))
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let entries = stmt
      .query_map(params![query], entry_from_row)
      .map_err(|e| eyre!("Failed to query cached books: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read cached book: {}", e))?;

    Ok(entries)
  }

  fn delete_by_query(&self, query: &str) -> Result<()> {
    self
      .lock()?
      .execute("DELETE FROM books WHERE search_query = ?", params![query])
      .map_err(|e| eyre!("Failed to delete cached books: {}", e))?;

    Ok(())
  }

  fn insert_all(&self, entries: &[CacheEntry]) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    insert_entries(&tx, entries)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))
  }

  fn replace_query(&self, query: &str, entries: &[CacheEntry]) -> Result<()> {
    if let Some(stray) = entries.iter().find(|e| e.search_query != query) {
      return Err(eyre!(
        "Book {} is keyed by '{}', not '{}'",
        stray.book.id,
        stray.search_query,
        query
      ));
    }

    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("DELETE FROM books WHERE search_query = ?", params![query])
      .map_err(|e| eyre!("Failed to delete old cached books: {}", e))?;
    insert_entries(&tx, entries)?;

    // Dropping an uncommitted transaction rolls it back
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))
  }

  fn recent(&self, limit: usize) -> Result<Vec<CacheEntry>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare_cached(&format!(
        "{SELECT_COLUMNS} ORDER BY cached_at DESC, position ASC LIMIT ?"
      ))
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let entries = stmt
      .query_map(params![limit as i64], entry_from_row)
      .map_err(|e| eyre!("Failed to query recent books: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read cached book: {}", e))?;

    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;
  use std::sync::Arc;

  fn entry(id: &str, query: &str, cached_at: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
      book: Book {
        id: id.to_string(),
        title: format!("Title {}", id),
        author: "Author".to_string(),
        thumbnail_url: Some(format!("https://img/{}.png", id)),
        description: "Description".to_string(),
      },
      search_query: query.to_string(),
      cached_at,
    }
  }

  fn ids(entries: &[CacheEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.book.id.as_str()).collect()
  }

  #[test]
  fn test_get_by_query_missing_group_is_empty() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert!(storage.get_by_query("nothing").unwrap().is_empty());
  }

  #[test]
  fn test_insert_and_read_back() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let now = Utc::now();
    let entries = vec![entry("a", "rust", now), entry("b", "rust", now)];

    storage.insert_all(&entries).unwrap();

    let stored = storage.get_by_query("rust").unwrap();
    assert_eq!(ids(&stored), vec!["a", "b"]);
    assert_eq!(stored[0].book, entries[0].book);
    assert_eq!(stored[0].cached_at.timestamp_millis(), now.timestamp_millis());
  }

  #[test]
  fn test_book_survives_storage_round_trip() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let bare = Book {
      id: "bare".to_string(),
      title: "Untitled Notes".to_string(),
      author: "Unknown Author".to_string(),
      thumbnail_url: None,
      description: "No description available".to_string(),
    };
    let pictured = entry("pictured", "rust", Utc::now()).book;

    storage
      .insert_all(&[
        bare.to_entry("rust", Utc::now()),
        pictured.to_entry("rust", Utc::now()),
      ])
      .unwrap();

    let restored: Vec<Book> = storage
      .get_by_query("rust")
      .unwrap()
      .into_iter()
      .map(Book::from)
      .collect();
    assert!(restored.contains(&bare));
    assert!(restored.contains(&pictured));
  }

  #[test]
  fn test_get_by_query_orders_most_recent_first() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let older = Utc::now() - Duration::hours(1);
    let newer = Utc::now();

    storage.insert_all(&[entry("old", "rust", older)]).unwrap();
    storage
      .insert_all(&[entry("new-1", "rust", newer), entry("new-2", "rust", newer)])
      .unwrap();

    let stored = storage.get_by_query("rust").unwrap();
    assert_eq!(ids(&stored), vec!["new-1", "new-2", "old"]);
  }

  #[test]
  fn test_insert_upserts_by_id() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let now = Utc::now();

    storage.insert_all(&[entry("a", "rust", now)]).unwrap();
    storage.insert_all(&[entry("a", "go", now)]).unwrap();

    assert!(storage.get_by_query("rust").unwrap().is_empty());
    assert_eq!(ids(&storage.get_by_query("go").unwrap()), vec!["a"]);
  }

  #[test]
  fn test_delete_by_query_leaves_other_groups() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let now = Utc::now();
    storage
      .insert_all(&[entry("a", "rust", now), entry("b", "go", now)])
      .unwrap();

    storage.delete_by_query("rust").unwrap();

    assert!(storage.get_by_query("rust").unwrap().is_empty());
    assert_eq!(ids(&storage.get_by_query("go").unwrap()), vec!["b"]);
  }

  #[test]
  fn test_replace_query_swaps_whole_group() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let now = Utc::now();
    storage
      .insert_all(&[
        entry("a", "rust", now),
        entry("b", "rust", now),
        entry("c", "rust", now),
      ])
      .unwrap();

    storage
      .replace_query("rust", &[entry("d", "rust", now), entry("e", "rust", now)])
      .unwrap();

    assert_eq!(ids(&storage.get_by_query("rust").unwrap()), vec!["d", "e"]);
  }

  #[test]
  fn test_replace_query_rejects_foreign_rows() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let now = Utc::now();
    storage.insert_all(&[entry("a", "rust", now)]).unwrap();

    let result = storage.replace_query("rust", &[entry("b", "go", now)]);

    assert!(result.is_err());
    // Nothing was deleted
    assert_eq!(ids(&storage.get_by_query("rust").unwrap()), vec!["a"]);
  }

  #[test]
  fn test_recent_spans_queries() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let base = Utc::now();
    storage
      .insert_all(&[entry("a", "rust", base - Duration::minutes(2))])
      .unwrap();
    storage
      .insert_all(&[entry("b", "go", base - Duration::minutes(1))])
      .unwrap();
    storage.insert_all(&[entry("c", "zig", base)]).unwrap();

    assert_eq!(ids(&storage.recent(2).unwrap()), vec!["c", "b"]);
    assert_eq!(ids(&storage.recent(20).unwrap()), vec!["c", "b", "a"]);
  }

  #[test]
  fn test_cache_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");
    let now = Utc::now();

    {
      let storage = SqliteStorage::open(Some(&path)).unwrap();
      storage.insert_all(&[entry("a", "rust", now)]).unwrap();
    }

    let reopened = SqliteStorage::open(Some(&path)).unwrap();
    assert_eq!(ids(&reopened.get_by_query("rust").unwrap()), vec!["a"]);
  }

  #[test]
  fn test_readers_never_see_partial_replace() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let now = Utc::now();
    let old: Vec<_> = (0..3).map(|i| entry(&format!("old-{}", i), "q", now)).collect();
    let new: Vec<_> = (0..5).map(|i| entry(&format!("new-{}", i), "q", now)).collect();
    storage.insert_all(&old).unwrap();

    let writer = {
      let storage = Arc::clone(&storage);
      std::thread::spawn(move || {
        for round in 0..50 {
          let group = if round % 2 == 0 { &new } else { &old };
          storage.replace_query("q", group).unwrap();
        }
      })
    };

    let readers: Vec<_> = (0..4)
      .map(|_| {
        let storage = Arc::clone(&storage);
        std::thread::spawn(move || {
          for _ in 0..100 {
            let rows = storage.get_by_query("q").unwrap();
            let all_old = rows.len() == 3 && rows.iter().all(|r| r.book.id.starts_with("old-"));
            let all_new = rows.len() == 5 && rows.iter().all(|r| r.book.id.starts_with("new-"));
            assert!(all_old || all_new, "observed mixed group: {:?}", ids(&rows));
          }
        })
      })
      .collect();

    writer.join().unwrap();
    for reader in readers {
      reader.join().unwrap();
    }
  }

  #[test]
  fn test_noop_storage_discards() {
    let storage = NoopStorage;
    storage.insert_all(&[entry("a", "rust", Utc::now())]).unwrap();
    assert!(storage.get_by_query("rust").unwrap().is_empty());
    assert!(storage.recent(10).unwrap().is_empty());
  }
}
