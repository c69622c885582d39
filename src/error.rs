//! Error taxonomy for query resolution.
//!
//! Only user input can be rejected outright. Every fetch-path failure is
//! absorbed by the repository's cache fallback and ends up as diagnostic
//! text in the published search state.

use thiserror::Error;

/// Raw user input that cannot be turned into a search key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
  #[error("search query is empty")]
  Empty,
}

/// Why a live fetch from the remote catalog did not produce results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The connectivity probe reported no usable network.
  #[error("No network connection available")]
  ConnectivityUnavailable,
  /// Network or HTTP failure, including timeouts.
  #[error("Network error: {0}")]
  Transport(String),
  /// The catalog answered with a payload we could not parse.
  #[error("Malformed catalog response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Short label used in structured log fields.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::ConnectivityUnavailable => "connectivity",
      Self::Transport(_) => "transport",
      Self::Decode(_) => "decode",
    }
  }
}
