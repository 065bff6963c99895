//! Single-slot cache for unpaginated lookups.
//!
//! Used for collections that are not partitioned by filter (most popular jobs,
//! recommendations): one value, one timestamp, one TTL.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{CacheResult, Clock, SystemClock};

/// Boxed unpaginated fetch adapter.
pub type ListFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Box a closure returning a future into a [`ListFn`].
pub fn lister<T, F, Fut>(f: F) -> ListFn<T>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T>> + Send + 'static,
{
  Arc::new(move || f().boxed())
}

struct Entry<T> {
  value: T,
  cached_at: DateTime<Utc>,
}

struct State<T> {
  entry: Option<Entry<T>>,
  loading: bool,
  /// Bumped by `invalidate`; results of fetches started earlier are dropped
  epoch: u64,
}

/// What a call to [`SnapshotCache::fetch`] ended up doing.
#[derive(Debug, Clone)]
pub enum SnapshotFetch<T> {
  /// Value served from the cache or the network
  Ready(CacheResult<T>),
  /// Another fetch is already running; nothing was done
  InFlight,
  /// The snapshot was invalidated while this fetch was running; its result was dropped
  Superseded,
}

impl<T> SnapshotFetch<T> {
  pub fn ready(self) -> Option<CacheResult<T>> {
    match self {
      SnapshotFetch::Ready(result) => Some(result),
      _ => None,
    }
  }
}

/// Clears the loading flag if the fetch future is dropped before it finishes.
struct LoadingGuard<'a, T> {
  state: &'a Mutex<State<T>>,
  epoch: u64,
  armed: bool,
}

impl<T> Drop for LoadingGuard<'_, T> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let mut state = self.state.lock();
    if state.epoch == self.epoch {
      state.loading = false;
    }
  }
}

/// Cache-first holder for one value.
pub struct SnapshotCache<T> {
  name: &'static str,
  state: Arc<Mutex<State<T>>>,
  fetcher: ListFn<T>,
  /// How long before cached data is considered stale
  ttl: Duration,
  clock: Arc<dyn Clock>,
}

impl<T: Clone + Send + Sync + 'static> SnapshotCache<T> {
  pub fn new(name: &'static str, fetcher: ListFn<T>) -> Self {
    Self {
      name,
      state: Arc::new(Mutex::new(State {
        entry: None,
        loading: false,
        epoch: 0,
      })),
      fetcher,
      ttl: Duration::minutes(5),
      clock: Arc::new(SystemClock),
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    self.clock.now() - cached_at >= self.ttl
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Cached and fresh: return it
  /// 2. Otherwise fetch from network and store the result
  /// 3. On network failure, return the stale value if there is one (offline mode)
  ///
  /// Only one fetch runs at a time; concurrent callers get `InFlight`.
  pub async fn fetch(&self) -> Result<SnapshotFetch<T>> {
    let (epoch, cached) = {
      let mut state = self.state.lock();
      if let Some(entry) = &state.entry {
        if !self.is_stale(entry.cached_at) {
          debug!(cache = self.name, "snapshot fresh");
          return Ok(SnapshotFetch::Ready(CacheResult::from_cache(
            entry.value.clone(),
            entry.cached_at,
          )));
        }
      }
      if state.loading {
        debug!(cache = self.name, "snapshot fetch already in flight");
        return Ok(SnapshotFetch::InFlight);
      }
      state.loading = true;
      let cached = state
        .entry
        .as_ref()
        .map(|entry| (entry.value.clone(), entry.cached_at));
      (state.epoch, cached)
    };

    let mut guard = LoadingGuard {
      state: &self.state,
      epoch,
      armed: true,
    };
    let result = (self.fetcher)().await;

    let mut state = self.state.lock();
    guard.armed = false;
    if state.epoch != epoch {
      debug!(cache = self.name, "dropping snapshot superseded by refresh");
      return Ok(SnapshotFetch::Superseded);
    }
    state.loading = false;

    match result {
      Ok(value) => {
        state.entry = Some(Entry {
          value: value.clone(),
          cached_at: self.clock.now(),
        });
        Ok(SnapshotFetch::Ready(CacheResult::from_network(value)))
      }
      Err(error) => match cached {
        Some((value, cached_at)) => {
          warn!(cache = self.name, error = %error, "fetch failed, serving stale snapshot");
          Ok(SnapshotFetch::Ready(CacheResult::offline(value, cached_at)))
        }
        None => Err(error),
      },
    }
  }

  /// Drop the cached value and fetch again.
  ///
  /// A fetch still running keeps running, but its result is discarded.
  pub async fn refresh(&self) -> Result<SnapshotFetch<T>> {
    self.invalidate();
    self.fetch().await
  }

  /// Cached value regardless of age.
  pub fn get(&self) -> Option<T> {
    self.state.lock().entry.as_ref().map(|e| e.value.clone())
  }

  pub fn has_valid_cache(&self) -> bool {
    self
      .state
      .lock()
      .entry
      .as_ref()
      .is_some_and(|e| !self.is_stale(e.cached_at))
  }

  pub fn is_loading(&self) -> bool {
    self.state.lock().loading
  }

  /// Drop the cached value and detach any running fetch.
  pub fn invalidate(&self) {
    let mut state = self.state.lock();
    state.entry = None;
    state.loading = false;
    state.epoch = state.epoch.wrapping_add(1);
  }
}

impl<T> Clone for SnapshotCache<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name,
      state: Arc::clone(&self.state),
      fetcher: Arc::clone(&self.fetcher),
      ttl: self.ttl,
      clock: Arc::clone(&self.clock),
    }
  }
}
