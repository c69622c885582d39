mod app;
mod books;
mod cache;
mod catalog;
mod commands;
mod config;
mod connectivity;
mod controller;
mod error;
mod event;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::controller::Phase;

#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(about = "Search a remote book catalog with an offline cache")]
#[command(version)]
struct Args {
  /// Search once, print the result and exit
  query: Option<String>,

  /// Path to config file (default: $XDG_CONFIG_HOME/bookshelf/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Never contact the catalog; answer from the cache only
  #[arg(long)]
  offline: bool,

  /// Disable the local cache
  #[arg(long)]
  no_cache: bool,

  /// Apply only the result of the most recently issued search
  #[arg(long)]
  discard_stale: bool,

  /// Write logs to stderr instead of the log file
  #[arg(long)]
  log_stderr: bool,
}

/// Install the tracing subscriber. The returned guard flushes the
/// non-blocking writer on drop.
fn init_logging(to_stderr: bool) -> Result<WorkerGuard> {
  let filter = EnvFilter::try_from_env("BOOKSHELF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  let (writer, guard) = if to_stderr {
    tracing_appender::non_blocking(std::io::stderr())
  } else {
    let log_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?
      .join("bookshelf");
    std::fs::create_dir_all(&log_dir)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;
    tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, "bookshelf.log"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(to_stderr)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging(args.log_stderr)?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line flags win over the file
  if args.no_cache {
    config.cache.enabled = false;
  }
  if args.discard_stale {
    config.search.discard_stale = true;
  }

  let mut app = app::App::new(&config, args.offline)?;

  if let Some(query) = args.query {
    let phase = app.run_once(&query).await?;
    if phase == Phase::Error {
      return Ok(ExitCode::from(1));
    }
    return Ok(ExitCode::SUCCESS);
  }

  app.run(config.search.default_query.as_deref()).await?;

  Ok(ExitCode::SUCCESS)
}
