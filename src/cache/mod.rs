//! Generic in-memory caching layer.
//!
//! This module is marketplace-agnostic. It provides:
//! - Filter key encoding for partitioning collections by query shape
//! - Keyed, paginated stores with per-key loading state and TTL staleness
//! - Single-slot snapshots for unpaginated lookups, with offline fallback
//! - Local membership sets and counters for optimistic updates

mod key;
mod local;
mod slice;
mod snapshot;
mod store;
mod traits;

pub use key::{FilterKey, KeyBuilder, NoFilter, SliceKey};
pub use local::{DeltaCounters, MembershipSet, MonotonicCounters};
pub use slice::Pagination;
pub use snapshot::{lister, ListFn, SnapshotCache, SnapshotFetch};
pub use store::{fetcher, CacheStore, FetchFn, FetchOutcome};
pub use traits::{
  CacheResult, CacheSource, Cacheable, Clock, EntityId, ManualClock, Page, PageRequest,
  SystemClock,
};
