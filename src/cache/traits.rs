//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;

/// Numeric identifier used by the backend for every entity.
pub type EntityId = i64;

/// Trait for entities that can be cached.
///
/// Implementors must provide the backend id, which is used to deduplicate
/// appended pages and to locate entities for local patches.
pub trait Cacheable: Clone + Send + Sync + 'static {
  /// Unique identifier for this entity (e.g., job id, application id)
  fn entity_id(&self) -> EntityId;

  /// Entity type name used in log fields (e.g., "job", "application")
  fn entity_type() -> &'static str;
}

/// One page of results as returned by a fetch adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  #[serde(default = "Vec::new")]
  pub content: Vec<T>,
  #[serde(default)]
  pub total_elements: u64,
  /// Authoritative for whether another page exists, independent of `total_elements`
  #[serde(default)]
  pub has_more: bool,
}

impl<T> Page<T> {
  pub fn new(content: Vec<T>, total_elements: u64, has_more: bool) -> Self {
    Self {
      content,
      total_elements,
      has_more,
    }
  }
}

/// Arguments handed to a paged fetch adapter.
#[derive(Debug, Clone)]
pub struct PageRequest<Q> {
  /// Parent entity the collection belongs to (job id, business id), if any
  pub scope: Option<EntityId>,
  pub page: u32,
  pub page_size: u32,
  pub filter: Q,
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Network unavailable, serving stale cached data
  Offline,
}

/// Source of "now" for staleness checks.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to. Used to pin TTL boundaries in tests.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Mutex::new(start),
    }
  }

  pub fn advance(&self, by: chrono::Duration) {
    let mut now = self.now.lock();
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_envelope_from_wire() {
    let json = r#"{"content":[1,2,3],"totalElements":7,"hasMore":true}"#;
    let page: Page<u32> = serde_json::from_str(json).unwrap();

    assert_eq!(page, Page::new(vec![1, 2, 3], 7, true));
  }

  #[test]
  fn test_page_envelope_missing_fields_default() {
    let page: Page<u32> = serde_json::from_str("{}").unwrap();

    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 0);
    assert!(!page.has_more);
  }

  #[test]
  fn test_manual_clock_advances() {
    let start = Utc::now();
    let clock = ManualClock::new(start);
    clock.advance(chrono::Duration::seconds(30));

    assert_eq!(clock.now() - start, chrono::Duration::seconds(30));
  }
}
