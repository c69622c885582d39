//! Remote book catalog.

mod api_types;
mod client;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::error::FetchError;

pub use client::HttpCatalogClient;

/// One search hit as reported by the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteItem {
  pub id: String,
  pub title: String,
  pub authors: Vec<String>,
  pub description: Option<String>,
  pub thumbnail_url: Option<String>,
}

/// A full search response. A response without items is an empty result,
/// not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteResult {
  pub total_items: u64,
  pub items: Vec<RemoteItem>,
}

/// Performs a text search against the remote catalog.
///
/// Implementations own their timeout policy; a timeout is reported as
/// [`FetchError::Transport`].
#[async_trait]
pub trait RemoteCatalogClient: Send + Sync {
  async fn search(&self, query: &str) -> Result<RemoteResult, FetchError>;
}
