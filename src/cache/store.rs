//! Generic keyed, paginated cache store.
//!
//! One `CacheStore` holds every slice of a single domain collection (e.g. all
//! application lists, one per job and filter). It is bound to a fetch adapter
//! at construction and exposes fetch / refresh / read operations plus
//! in-place patching for optimistic updates.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::key::{FilterKey, SliceKey};
use super::slice::{Pagination, Slice};
use super::traits::{Cacheable, Clock, EntityId, Page, PageRequest, SystemClock};

/// Boxed paged fetch adapter.
pub type FetchFn<Q, T> =
  Arc<dyn Fn(PageRequest<Q>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// Box a closure returning a future into a [`FetchFn`].
pub fn fetcher<Q, T, F, Fut>(f: F) -> FetchFn<Q, T>
where
  F: Fn(PageRequest<Q>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
  Arc::new(move |request| f(request).boxed())
}

/// What a call to [`CacheStore::fetch`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// Page merged into the slice
  Loaded { page: u32, has_more: bool },
  /// Another fetch for this key was already running; nothing was done
  InFlight,
  /// Cached data is still within its TTL; nothing was done
  Fresh,
  /// No further page exists
  Exhausted,
  /// The adapter failed; the slice was left as it was
  Failed,
  /// The slice was reset while this fetch was running; its result was dropped
  Superseded,
}

struct Inner<T> {
  slices: Mutex<HashMap<SliceKey, Slice<T>>>,
  revision: watch::Sender<u64>,
}

impl<T> Inner<T> {
  fn bump(&self) {
    self.revision.send_modify(|r| *r = r.wrapping_add(1));
  }
}

/// Clears the loading flag if the fetch future is dropped before it finishes.
struct LoadingGuard<'a, T> {
  inner: &'a Inner<T>,
  key: &'a SliceKey,
  epoch: u64,
  armed: bool,
}

impl<T> Drop for LoadingGuard<'_, T> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    {
      let mut slices = self.inner.slices.lock();
      if let Some(slice) = slices.get_mut(self.key) {
        if slice.epoch == self.epoch {
          slice.loading = false;
        }
      }
    }
    self.inner.bump();
  }
}

/// Keyed cache of paginated collections with per-key loading state and TTL.
pub struct CacheStore<Q, T> {
  name: &'static str,
  inner: Arc<Inner<T>>,
  fetcher: FetchFn<Q, T>,
  /// How long before cached data is considered stale
  ttl: Duration,
  page_size: u32,
  clock: Arc<dyn Clock>,
}

impl<Q: FilterKey, T: Cacheable> CacheStore<Q, T> {
  /// Create a store named `name` (used in log fields) bound to `fetcher`.
  pub fn new(name: &'static str, fetcher: FetchFn<Q, T>) -> Self {
    let (revision, _) = watch::channel(0);
    Self {
      name,
      inner: Arc::new(Inner {
        slices: Mutex::new(HashMap::new()),
        revision,
      }),
      fetcher,
      ttl: Duration::minutes(5),
      page_size: 10,
      clock: Arc::new(SystemClock),
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Fetch one page for `filter` under `scope` and merge it into the cache.
  ///
  /// Page 0 replaces the cached items, later pages append. Failures are
  /// logged and swallowed; the previous data stays in place. At most one
  /// fetch per key runs at a time.
  pub async fn fetch(&self, scope: Option<EntityId>, filter: &Q, page: u32) -> FetchOutcome {
    let key = SliceKey::new(scope, filter);

    let epoch = {
      let mut slices = self.inner.slices.lock();
      let slice = slices.entry(key.clone()).or_default();
      if slice.loading {
        debug!(store = self.name, key = %key.fingerprint(), page, "fetch already in flight");
        return FetchOutcome::InFlight;
      }
      slice.loading = true;
      slice.epoch
    };
    self.inner.bump();

    let mut guard = LoadingGuard {
      inner: &self.inner,
      key: &key,
      epoch,
      armed: true,
    };

    let request = PageRequest {
      scope,
      page,
      page_size: self.page_size,
      filter: filter.clone(),
    };
    let result = (self.fetcher)(request).await;

    let outcome = {
      let mut slices = self.inner.slices.lock();
      let slice = slices.entry(key.clone()).or_default();
      guard.armed = false;

      if slice.epoch != epoch {
        debug!(
          store = self.name,
          key = %key.fingerprint(),
          page,
          "dropping result of fetch superseded by refresh"
        );
        FetchOutcome::Superseded
      } else {
        slice.loading = false;
        match result {
          Ok(data) => {
            let has_more = data.has_more;
            let received = data.content.len();
            slice.apply_page(page, data, self.clock.now());
            info!(
              store = self.name,
              entity = T::entity_type(),
              key = %key.fingerprint(),
              page,
              received,
              cached = slice.items.len(),
              has_more,
              "page loaded"
            );
            FetchOutcome::Loaded { page, has_more }
          }
          Err(error) => {
            warn!(
              store = self.name,
              key = %key.fingerprint(),
              page,
              error = %error,
              "fetch failed, keeping cached data"
            );
            FetchOutcome::Failed
          }
        }
      }
    };
    self.inner.bump();

    outcome
  }

  /// Fetch the page after the current one, or page 0 if nothing is cached.
  pub async fn fetch_next_page(&self, scope: Option<EntityId>, filter: &Q) -> FetchOutcome {
    let key = SliceKey::new(scope, filter);
    let next = {
      let slices = self.inner.slices.lock();
      match slices.get(&key) {
        Some(slice) if slice.is_populated() => {
          if !slice.pagination.has_more {
            return FetchOutcome::Exhausted;
          }
          slice.pagination.current_page + 1
        }
        _ => 0,
      }
    };
    self.fetch(scope, filter, next).await
  }

  /// Fetch page 0 unless the cached slice is still within its TTL.
  pub async fn fetch_if_stale(&self, scope: Option<EntityId>, filter: &Q) -> FetchOutcome {
    if self.has_valid_cache(scope, filter) {
      return FetchOutcome::Fresh;
    }
    self.fetch(scope, filter, 0).await
  }

  /// Drop everything cached for the key and load page 0 again.
  ///
  /// A fetch still running for the key keeps running, but its result is discarded.
  pub async fn refresh(&self, scope: Option<EntityId>, filter: &Q) -> FetchOutcome {
    self.invalidate(scope, filter);
    self.fetch(scope, filter, 0).await
  }

  /// Drop everything cached for the key without refetching.
  pub fn invalidate(&self, scope: Option<EntityId>, filter: &Q) {
    let key = SliceKey::new(scope, filter);
    {
      let mut slices = self.inner.slices.lock();
      if let Some(slice) = slices.get_mut(&key) {
        slice.reset();
      }
    }
    self.inner.bump();
  }

  /// Drop every slice under `scope`.
  pub fn invalidate_scope(&self, scope: EntityId) {
    {
      let mut slices = self.inner.slices.lock();
      slices
        .iter_mut()
        .filter(|(key, _)| key.scope == Some(scope))
        .for_each(|(_, slice)| slice.reset());
    }
    self.inner.bump();
  }

  /// Drop every slice.
  pub fn clear(&self) {
    {
      let mut slices = self.inner.slices.lock();
      slices.values_mut().for_each(Slice::reset);
    }
    self.inner.bump();
  }

  /// Cached items for the key; `None` until a fetch has succeeded.
  pub fn get(&self, scope: Option<EntityId>, filter: &Q) -> Option<Vec<T>> {
    self.read(scope, filter, |slice| {
      slice.is_populated().then(|| slice.items.clone())
    })
    .flatten()
  }

  pub fn is_loading(&self, scope: Option<EntityId>, filter: &Q) -> bool {
    self
      .read(scope, filter, |slice| slice.loading)
      .unwrap_or(false)
  }

  /// Whether the key was fetched less than the TTL ago.
  pub fn has_valid_cache(&self, scope: Option<EntityId>, filter: &Q) -> bool {
    let now = self.clock.now();
    self
      .last_fetched_at(scope, filter)
      .is_some_and(|at| now - at < self.ttl)
  }

  pub fn last_fetched_at(&self, scope: Option<EntityId>, filter: &Q) -> Option<DateTime<Utc>> {
    self
      .read(scope, filter, |slice| slice.last_fetched_at)
      .flatten()
  }

  pub fn total_count(&self, scope: Option<EntityId>, filter: &Q) -> u64 {
    self
      .read(scope, filter, |slice| slice.total_count)
      .unwrap_or(0)
  }

  pub fn pagination(&self, scope: Option<EntityId>, filter: &Q) -> Pagination {
    self
      .read(scope, filter, |slice| slice.pagination)
      .unwrap_or_default()
  }

  /// Every distinct cached entity across all slices, first occurrence wins.
  pub fn all_items(&self) -> Vec<T> {
    let slices = self.inner.slices.lock();
    let mut keys: Vec<&SliceKey> = slices.keys().collect();
    keys.sort();

    let mut seen = HashSet::new();
    keys
      .into_iter()
      .flat_map(|key| slices[key].items.iter())
      .filter(|item| seen.insert(item.entity_id()))
      .cloned()
      .collect()
  }

  /// Apply `patch` to every cached item in slices under `scope` (or in all
  /// slices when `scope` is `None`). `patch` returns whether it changed the
  /// item; the number of changed items is returned.
  pub fn patch_items<F>(&self, scope: Option<EntityId>, mut patch: F) -> usize
  where
    F: FnMut(&mut T) -> bool,
  {
    let patched = {
      let mut slices = self.inner.slices.lock();
      slices
        .iter_mut()
        .filter(|(key, _)| scope.is_none() || key.scope == scope)
        .flat_map(|(_, slice)| slice.items.iter_mut())
        .map(|item| patch(item))
        .filter(|changed| *changed)
        .count()
    };
    if patched > 0 {
      debug!(store = self.name, ?scope, patched, "patched cached items");
      self.inner.bump();
    }
    patched
  }

  /// Patch the entity with `id` wherever it is cached under `scope`.
  pub fn patch_entity<F>(&self, scope: Option<EntityId>, id: EntityId, mut patch: F) -> usize
  where
    F: FnMut(&mut T),
  {
    self.patch_items(scope, |item| {
      if item.entity_id() == id {
        patch(item);
        true
      } else {
        false
      }
    })
  }

  /// Remove the entity with `id` from every slice under `scope`.
  pub fn remove_item(&self, scope: Option<EntityId>, id: EntityId) -> usize {
    let removed = {
      let mut slices = self.inner.slices.lock();
      slices
        .iter_mut()
        .filter(|(key, _)| scope.is_none() || key.scope == scope)
        .filter(|(_, slice)| slice.is_populated())
        .map(|(_, slice)| slice.remove(id))
        .filter(|removed| *removed)
        .count()
    };
    if removed > 0 {
      self.inner.bump();
    }
    removed
  }

  /// Put `item` at the front of an already-populated slice, replacing any
  /// cached copy with the same id. Returns false if the slice isn't cached.
  pub fn prepend_item(&self, scope: Option<EntityId>, filter: &Q, item: T) -> bool {
    let key = SliceKey::new(scope, filter);
    let inserted = {
      let mut slices = self.inner.slices.lock();
      match slices.get_mut(&key) {
        Some(slice) if slice.is_populated() => {
          let existed = slice.remove(item.entity_id());
          slice.items.insert(0, item);
          slice.total_count += 1;
          if existed {
            debug!(store = self.name, key = %key.fingerprint(), "replaced cached copy");
          }
          true
        }
        _ => false,
      }
    };
    if inserted {
      self.inner.bump();
    }
    inserted
  }

  /// Receiver that changes whenever any slice of this store changes.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.inner.revision.subscribe()
  }

  fn read<R>(&self, scope: Option<EntityId>, filter: &Q, f: impl FnOnce(&Slice<T>) -> R) -> Option<R> {
    let key = SliceKey::new(scope, filter);
    let slices = self.inner.slices.lock();
    slices.get(&key).map(f)
  }
}

impl<Q, T> Clone for CacheStore<Q, T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name,
      inner: Arc::clone(&self.inner),
      fetcher: Arc::clone(&self.fetcher),
      ttl: self.ttl,
      page_size: self.page_size,
      clock: Arc::clone(&self.clock),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::key::KeyBuilder;
  use crate::cache::traits::ManualClock;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use tokio::sync::Notify;

  #[derive(Debug, Clone, PartialEq)]
  struct Item {
    id: i64,
    status: &'static str,
  }

  fn item(id: i64) -> Item {
    Item { id, status: "new" }
  }

  impl Cacheable for Item {
    fn entity_id(&self) -> EntityId {
      self.id
    }

    fn entity_type() -> &'static str {
      "item"
    }
  }

  #[derive(Debug, Clone, Default)]
  struct Filter {
    tags: Vec<String>,
  }

  impl FilterKey for Filter {
    fn encode(&self) -> String {
      KeyBuilder::new().list(&self.tags).finish()
    }
  }

  fn tags(values: &[&str]) -> Filter {
    Filter {
      tags: values.iter().map(|s| s.to_string()).collect(),
    }
  }

  fn ids(items: Option<Vec<Item>>) -> Vec<i64> {
    items.unwrap_or_default().iter().map(|i| i.id).collect()
  }

  /// Adapter returning two items per page: page p yields ids 2p and 2p+1.
  fn paged_store(calls: Arc<AtomicUsize>) -> CacheStore<Filter, Item> {
    CacheStore::new(
      "test",
      fetcher(move |req: PageRequest<Filter>| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          let base = req.page as i64 * 2;
          Ok(Page::new(vec![item(base), item(base + 1)], 6, req.page < 2))
        }
      }),
    )
  }

  #[tokio::test]
  async fn test_page_zero_then_append() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));
    let filter = tags(&["rust"]);

    assert_eq!(store.get(None, &filter), None);
    assert_eq!(
      store.fetch(None, &filter, 0).await,
      FetchOutcome::Loaded {
        page: 0,
        has_more: true
      }
    );
    store.fetch(None, &filter, 1).await;

    assert_eq!(ids(store.get(None, &filter)), vec![0, 1, 2, 3]);
    assert_eq!(store.total_count(None, &filter), 6);
    assert_eq!(store.pagination(None, &filter).current_page, 1);
  }

  #[tokio::test]
  async fn test_page_zero_replaces_accumulated_pages() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));
    let filter = tags(&[]);

    store.fetch(None, &filter, 0).await;
    store.fetch(None, &filter, 1).await;
    store.fetch(None, &filter, 0).await;

    assert_eq!(ids(store.get(None, &filter)), vec![0, 1]);
  }

  #[tokio::test]
  async fn test_overlapping_page_is_deduplicated() {
    let store = CacheStore::new(
      "test",
      fetcher(|req: PageRequest<Filter>| async move {
        let content = if req.page == 0 {
          vec![item(1), item(2)]
        } else {
          vec![item(2), item(3)]
        };
        Ok(Page::new(content, 3, req.page == 0))
      }),
    );
    let filter = tags(&[]);

    store.fetch(None, &filter, 0).await;
    store.fetch(None, &filter, 1).await;

    assert_eq!(ids(store.get(None, &filter)), vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_equivalent_filters_share_a_slice() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = paged_store(calls.clone());

    store.fetch(None, &tags(&["a", "b"]), 0).await;

    assert!(store.get(None, &tags(&["b", "a"])).is_some());
    assert!(store.get(None, &tags(&["a"])).is_none());
  }

  #[tokio::test]
  async fn test_second_fetch_while_loading_is_noop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let store = {
      let calls = calls.clone();
      let gate = gate.clone();
      CacheStore::new(
        "test",
        fetcher(move |_req: PageRequest<Filter>| {
          let calls = calls.clone();
          let gate = gate.clone();
          async move {
            calls.fetch_add(1, Ordering::SeqCst);
            gate.notified().await;
            Ok(Page::new(vec![item(1)], 1, false))
          }
        }),
      )
    };
    let filter = tags(&["x"]);

    let first = {
      let store = store.clone();
      let filter = filter.clone();
      tokio::spawn(async move { store.fetch(None, &filter, 0).await })
    };
    while !store.is_loading(None, &filter) {
      tokio::task::yield_now().await;
    }

    assert_eq!(store.fetch(None, &filter, 0).await, FetchOutcome::InFlight);
    assert_eq!(store.fetch(None, &filter, 1).await, FetchOutcome::InFlight);

    gate.notify_one();
    assert!(matches!(
      first.await.unwrap(),
      FetchOutcome::Loaded { .. }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!store.is_loading(None, &filter));
  }

  #[tokio::test]
  async fn test_ttl_boundary() {
    let start = Utc::now();
    let clock = Arc::new(ManualClock::new(start));
    let store = paged_store(Arc::new(AtomicUsize::new(0)))
      .with_ttl(Duration::minutes(2))
      .with_clock(clock.clone());
    let filter = tags(&[]);

    assert!(!store.has_valid_cache(None, &filter));
    store.fetch(None, &filter, 0).await;
    assert_eq!(store.last_fetched_at(None, &filter), Some(start));

    clock.advance(Duration::minutes(2) - Duration::milliseconds(1));
    assert!(store.has_valid_cache(None, &filter));

    clock.advance(Duration::milliseconds(1));
    assert!(!store.has_valid_cache(None, &filter));
  }

  #[tokio::test]
  async fn test_fetch_if_stale_skips_fresh_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = paged_store(calls.clone());
    let filter = tags(&[]);

    store.fetch_if_stale(None, &filter).await;
    assert_eq!(store.fetch_if_stale(None, &filter).await, FetchOutcome::Fresh);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_next_page_until_exhausted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = paged_store(calls.clone());
    let filter = tags(&[]);

    store.fetch_next_page(None, &filter).await;
    store.fetch_next_page(None, &filter).await;
    store.fetch_next_page(None, &filter).await;

    assert_eq!(store.fetch_next_page(None, &filter).await, FetchOutcome::Exhausted);
    assert_eq!(ids(store.get(None, &filter)), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_failure_keeps_previous_state() {
    let fail = Arc::new(AtomicBool::new(false));
    let store = {
      let fail = fail.clone();
      CacheStore::new(
        "test",
        fetcher(move |req: PageRequest<Filter>| {
          let fail = fail.load(Ordering::SeqCst);
          async move {
            if fail {
              Err(eyre!("connection reset"))
            } else {
              Ok(Page::new(vec![item(req.page as i64)], 5, true))
            }
          }
        }),
      )
    };
    let filter = tags(&[]);

    store.fetch(None, &filter, 0).await;
    fail.store(true, Ordering::SeqCst);

    assert_eq!(store.fetch(None, &filter, 1).await, FetchOutcome::Failed);
    assert_eq!(ids(store.get(None, &filter)), vec![0]);
    assert_eq!(store.pagination(None, &filter).current_page, 0);
    assert!(!store.is_loading(None, &filter));
  }

  #[tokio::test]
  async fn test_failure_from_empty_stays_empty() {
    let store: CacheStore<Filter, Item> = CacheStore::new(
      "test",
      fetcher(|_req: PageRequest<Filter>| async { Err(eyre!("503")) }),
    );
    let filter = tags(&[]);

    assert_eq!(store.fetch(None, &filter, 0).await, FetchOutcome::Failed);
    assert_eq!(store.get(None, &filter), None);
    assert!(!store.has_valid_cache(None, &filter));
  }

  #[tokio::test]
  async fn test_refresh_discards_accumulated_pages() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = paged_store(calls.clone());
    let filter = tags(&[]);

    store.fetch(None, &filter, 0).await;
    store.fetch(None, &filter, 1).await;
    store.refresh(None, &filter).await;

    assert_eq!(ids(store.get(None, &filter)), vec![0, 1]);
    assert_eq!(store.pagination(None, &filter).current_page, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_refresh_supersedes_in_flight_fetch() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let store = {
      let gate = gate.clone();
      let calls = calls.clone();
      CacheStore::new(
        "test",
        fetcher(move |_req: PageRequest<Filter>| {
          let gate = gate.clone();
          let call = calls.fetch_add(1, Ordering::SeqCst);
          async move {
            if call == 0 {
              gate.notified().await;
              Ok(Page::new(vec![item(100)], 1, false))
            } else {
              Ok(Page::new(vec![item(200)], 1, false))
            }
          }
        }),
      )
    };
    let filter = tags(&[]);

    let stale = {
      let store = store.clone();
      let filter = filter.clone();
      tokio::spawn(async move { store.fetch(None, &filter, 0).await })
    };
    while !store.is_loading(None, &filter) {
      tokio::task::yield_now().await;
    }

    assert!(matches!(
      store.refresh(None, &filter).await,
      FetchOutcome::Loaded { .. }
    ));
    gate.notify_one();

    assert_eq!(stale.await.unwrap(), FetchOutcome::Superseded);
    assert_eq!(ids(store.get(None, &filter)), vec![200]);
    assert!(!store.is_loading(None, &filter));
  }

  #[tokio::test]
  async fn test_dropped_fetch_clears_loading() {
    let store: CacheStore<Filter, Item> = CacheStore::new(
      "test",
      fetcher(|_req: PageRequest<Filter>| futures::future::pending()),
    );
    let filter = tags(&[]);

    {
      let fut = store.fetch(None, &filter, 0);
      tokio::pin!(fut);
      assert!(futures::poll!(fut.as_mut()).is_pending());
      assert!(store.is_loading(None, &filter));
    }

    assert!(!store.is_loading(None, &filter));
  }

  #[tokio::test]
  async fn test_patch_limited_to_scope() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));

    store.fetch(Some(1), &tags(&["a"]), 0).await;
    store.fetch(Some(1), &tags(&["b"]), 0).await;
    store.fetch(Some(2), &tags(&["a"]), 0).await;

    let patched = store.patch_entity(Some(1), 1, |item| item.status = "shortlisted");
    assert_eq!(patched, 2);

    let status_of = |scope, filter: &Filter| {
      store
        .get(Some(scope), filter)
        .unwrap()
        .into_iter()
        .find(|i| i.id == 1)
        .unwrap()
        .status
    };
    assert_eq!(status_of(1, &tags(&["a"])), "shortlisted");
    assert_eq!(status_of(1, &tags(&["b"])), "shortlisted");
    assert_eq!(status_of(2, &tags(&["a"])), "new");
  }

  #[tokio::test]
  async fn test_remove_and_prepend() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));
    let filter = tags(&[]);

    assert!(!store.prepend_item(None, &filter, item(9)));
    store.fetch(None, &filter, 0).await;

    assert!(store.prepend_item(None, &filter, item(9)));
    assert_eq!(ids(store.get(None, &filter)), vec![9, 0, 1]);
    assert_eq!(store.total_count(None, &filter), 7);

    assert_eq!(store.remove_item(None, 0), 1);
    assert_eq!(ids(store.get(None, &filter)), vec![9, 1]);
    assert_eq!(store.total_count(None, &filter), 6);
  }

  #[tokio::test]
  async fn test_invalidate_scope_and_clear() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));
    let filter = tags(&[]);

    store.fetch(Some(1), &filter, 0).await;
    store.fetch(Some(2), &filter, 0).await;
    store.fetch(None, &filter, 0).await;

    store.invalidate_scope(1);
    assert!(store.get(Some(1), &filter).is_none());
    assert!(store.get(Some(2), &filter).is_some());

    store.clear();
    assert!(store.get(Some(2), &filter).is_none());
    assert!(store.get(None, &filter).is_none());
    assert!(store.all_items().is_empty());
  }

  #[tokio::test]
  async fn test_subscribers_see_changes() {
    let store = paged_store(Arc::new(AtomicUsize::new(0)));
    let mut rx = store.subscribe();
    let before = *rx.borrow_and_update();

    store.fetch(None, &tags(&[]), 0).await;

    assert!(rx.has_changed().unwrap());
    assert!(*rx.borrow() > before);
  }
}
