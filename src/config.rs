use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::EntityId;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Signed-in job seeker, if any
  pub user_id: Option<EntityId>,
  /// Signed-in business, if any
  pub business_id: Option<EntityId>,
  /// Items requested per page from every paged endpoint
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  #[serde(default)]
  pub ttl: TtlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Staleness tolerance per collection, in seconds.
///
/// Collaborative data that changes often gets short TTLs, personal data that
/// rarely changes gets long ones.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TtlConfig {
  pub business_jobs: u64,
  pub popular_jobs: u64,
  pub applications: u64,
  pub user_jobs: u64,
  pub applied_jobs: u64,
  pub favorites: u64,
  pub recommendations: u64,
  pub interviews: u64,
  pub conversations: u64,
}

impl Default for TtlConfig {
  fn default() -> Self {
    Self {
      business_jobs: 2 * 60,
      popular_jobs: 5 * 60,
      applications: 5 * 60,
      user_jobs: 10 * 60,
      applied_jobs: 10 * 60,
      favorites: 30 * 60,
      recommendations: 24 * 60 * 60,
      interviews: 5 * 60,
      conversations: 60,
    }
  }
}

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Convert a configured TTL to a duration, capped at ten years.
pub fn ttl(secs: u64) -> Duration {
  Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

fn default_page_size() -> u32 {
  10
}

fn default_timeout_secs() -> u64 {
  30
}

impl Config {
  /// Configuration with defaults for everything but the backend URL.
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      api: ApiConfig {
        base_url: base_url.into(),
        timeout_secs: default_timeout_secs(),
      },
      user_id: None,
      business_id: None,
      page_size: default_page_size(),
      ttl: TtlConfig::default(),
    }
  }

  /// Read the marketplace settings.
  ///
  /// An explicit `path` must exist. Without one, `jobcache.yaml` in the
  /// working directory wins over the per-user file under the config dir.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let file = match path {
      Some(p) if !p.exists() => {
        return Err(eyre!("No marketplace settings at {}", p.display()));
      }
      Some(p) => p.to_path_buf(),
      None => Self::discover().ok_or_else(|| {
        eyre!(
          "No marketplace settings found (looked for ./jobcache.yaml and {}). \
           Create one or pass --api-url.",
          Self::user_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the user config directory".to_string())
        )
      })?,
    };
    Self::read(&file)
  }

  /// Like [`Config::load`], but `None` when no settings file exists anywhere.
  pub fn try_load(path: Option<&Path>) -> Result<Option<Self>> {
    match path {
      Some(_) => Self::load(path).map(Some),
      None => Self::discover().map(|file| Self::read(&file)).transpose(),
    }
  }

  fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jobcache").join("config.yaml"))
  }

  fn discover() -> Option<PathBuf> {
    std::iter::once(PathBuf::from("jobcache.yaml"))
      .chain(Self::user_config_path())
      .find(|candidate| candidate.exists())
  }

  fn read(file: &Path) -> Result<Self> {
    let yaml = std::fs::read_to_string(file)
      .map_err(|e| eyre!("Cannot read marketplace settings {}: {}", file.display(), e))?;
    Self::parse(&yaml).map_err(|e| eyre!("Invalid marketplace settings in {}: {}", file.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    Ok(config)
  }

  /// Bearer token for signed-in requests, from `JOBCACHE_TOKEN`.
  pub fn get_api_token() -> Result<String> {
    std::env::var("JOBCACHE_TOKEN").map_err(|_| eyre!("JOBCACHE_TOKEN is not set"))
  }
}
