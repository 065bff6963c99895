use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
  fmt,
  layer::{Layer, SubscriberExt},
  util::SubscriberInitExt,
  EnvFilter,
};

/// Environment variable holding the log filter, e.g. `jobcache=debug`.
pub const LOG_ENV: &str = "JOBCACHE_LOG";

/// Install the global subscriber.
///
/// Logs go to a daily-rotated file under the data directory unless
/// `to_stderr` is set. The returned guard must live until exit so buffered
/// lines get flushed.
pub fn init(to_stderr: bool) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::builder()
    .with_default_directive(tracing::Level::INFO.into())
    .with_env_var(LOG_ENV)
    .from_env_lossy();

  let (layer, guard) = if to_stderr {
    let layer = fmt::layer()
      .compact()
      .with_target(true)
      .with_writer(std::io::stderr)
      .boxed();
    (layer, None)
  } else {
    let dir = log_dir().ok_or_else(|| eyre!("Could not determine a data directory for logs"))?;
    std::fs::create_dir_all(&dir)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

    let appender = tracing_appender::rolling::daily(&dir, "jobcache.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
      .with_ansi(false)
      .with_target(true)
      .with_writer(writer)
      .boxed();
    (layer, Some(guard))
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(guard)
}

/// `$XDG_DATA_HOME/jobcache/logs`
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("jobcache").join("logs"))
}
