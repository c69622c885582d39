use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;
use url::{form_urlencoded, Url};

use super::api_types::ApiVolumesResponse;
use super::{RemoteCatalogClient, RemoteResult};
use crate::books::TERM_DELIMITER;
use crate::config::CatalogConfig;
use crate::error::FetchError;

/// Google Books API client
#[derive(Clone)]
pub struct HttpCatalogClient {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpCatalogClient {
  pub fn new(config: &CatalogConfig) -> Result<Self> {
    let base_url = parse_base_url(&config.base_url)?;

    let client = reqwest::Client::builder()
      .connect_timeout(config.timeout())
      .timeout(config.timeout())
      .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  /// Build the volumes search URL. The normalized query is sent as-is:
  /// `+` already separates terms and each term is form-encoded.
  fn search_url(&self, query: &str) -> Result<Url, FetchError> {
    let mut url = self
      .base_url
      .join("volumes")
      .map_err(|e| FetchError::Transport(format!("invalid catalog URL: {}", e)))?;

    let encoded = query
      .split(TERM_DELIMITER)
      .map(|term| form_urlencoded::byte_serialize(term.as_bytes()).collect::<String>())
      .collect::<Vec<_>>()
      .join(&TERM_DELIMITER.to_string());
    url.set_query(Some(&format!("q={}", encoded)));

    Ok(url)
  }
}

#[async_trait]
impl RemoteCatalogClient for HttpCatalogClient {
  async fn search(&self, query: &str) -> Result<RemoteResult, FetchError> {
    let url = self.search_url(query)?;
    debug!(%url, "Searching catalog");

    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Transport(format!(
        "catalog responded with HTTP {}",
        status
      )));
    }

    let body = response.bytes().await.map_err(transport_error)?;
    debug!(%status, bytes = body.len(), "Catalog response received");

    let parsed: ApiVolumesResponse =
      serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(parsed.into())
  }
}

/// Make sure the base URL ends with `/` so relative joins append to it.
fn parse_base_url(raw: &str) -> Result<Url> {
  let with_slash = if raw.ends_with('/') {
    raw.to_string()
  } else {
    format!("{}/", raw)
  };
  Url::parse(&with_slash).map_err(|e| eyre!("Invalid catalog base URL '{}': {}", raw, e))
}

fn transport_error(e: reqwest::Error) -> FetchError {
  if e.is_timeout() {
    FetchError::Transport("request timed out".to_string())
  } else {
    FetchError::Transport(e.to_string())
  }
}
