//! Network availability checks performed before hitting the catalog.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Answers whether a remote fetch is worth attempting.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
  async fn is_available(&self) -> bool;
}

/// Probe that issues a HEAD request with a short timeout.
///
/// Any HTTP response, even an error status, means the network is up.
pub struct HttpProbe {
  client: reqwest::Client,
  url: String,
}

impl HttpProbe {
  pub fn new(url: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create probe client: {}", e))?;

    Ok(Self {
      client,
      url: url.to_string(),
    })
  }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
  async fn is_available(&self) -> bool {
    match self.client.head(&self.url).send().await {
      Ok(resp) => {
        debug!(url = %self.url, status = %resp.status(), "Connectivity probe answered");
        true
      }
      Err(e) => {
        debug!(url = %self.url, "Connectivity probe failed: {}", e);
        false
      }
    }
  }
}

/// Probe with a fixed answer. Backs `--offline` and tests.
pub struct StaticProbe {
  online: AtomicBool,
}

impl StaticProbe {
  #[cfg(test)]
  pub fn online() -> Self {
    Self {
      online: AtomicBool::new(true),
    }
  }

  pub fn offline() -> Self {
    Self {
      online: AtomicBool::new(false),
    }
  }

  #[cfg(test)]
  pub fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
  async fn is_available(&self) -> bool {
    self.online.load(Ordering::SeqCst)
  }
}
