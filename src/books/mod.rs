//! Book domain: query normalization, mapping and the caching repository.

pub mod cache;
mod normalize;
mod repository;
pub mod types;

pub use normalize::{normalize, TERM_DELIMITER};
pub use repository::{BookRepository, BookResults};
pub use types::Book;
