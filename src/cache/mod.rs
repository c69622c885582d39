//! Local book cache for offline support.
//!
//! This module persists the books fetched for each normalized query so they
//! can be served when the remote catalog is unreachable:
//! - Rows are grouped by the query that fetched them
//! - A group is replaced atomically after every non-empty remote fetch
//! - Book ids are unique across the whole store

mod storage;
mod traits;

pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::CacheEntry;
