//! Local state mutated by the UI after a write the server already accepted.
//!
//! These live next to the paginated slices but are independent of them.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

/// Set of ids (favorites, shortlisted candidates, applied jobs).
#[derive(Debug)]
pub struct MembershipSet<K> {
  members: Arc<RwLock<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> MembershipSet<K> {
  pub fn new() -> Self {
    Self {
      members: Arc::new(RwLock::new(HashSet::new())),
    }
  }

  /// Returns false if `key` was already present.
  pub fn insert(&self, key: K) -> bool {
    self.members.write().insert(key)
  }

  /// Returns false if `key` was absent.
  pub fn remove(&self, key: &K) -> bool {
    self.members.write().remove(key)
  }

  pub fn contains(&self, key: &K) -> bool {
    self.members.read().contains(key)
  }

  /// Replace the whole set, e.g. after the authoritative list was fetched.
  pub fn replace_all(&self, keys: impl IntoIterator<Item = K>) {
    *self.members.write() = keys.into_iter().collect();
  }

  pub fn extend(&self, keys: impl IntoIterator<Item = K>) {
    self.members.write().extend(keys);
  }

  pub fn len(&self) -> usize {
    self.members.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.read().is_empty()
  }

  pub fn clear(&self) {
    self.members.write().clear();
  }
}

impl<K: Eq + Hash + Clone> Default for MembershipSet<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> Clone for MembershipSet<K> {
  fn clone(&self) -> Self {
    Self {
      members: Arc::clone(&self.members),
    }
  }
}

/// Last known server counts that never move backwards (views, applicants).
#[derive(Debug)]
pub struct MonotonicCounters<K> {
  values: Arc<RwLock<HashMap<K, u64>>>,
}

impl<K: Eq + Hash + Clone> MonotonicCounters<K> {
  pub fn new() -> Self {
    Self {
      values: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  /// Store `value` if it is higher than the current one. Returns the stored value.
  pub fn set(&self, key: K, value: u64) -> u64 {
    let mut values = self.values.write();
    let current = values.entry(key).or_insert(0);
    *current = (*current).max(value);
    *current
  }

  pub fn get(&self, key: &K) -> Option<u64> {
    self.values.read().get(key).copied()
  }

  pub fn clear(&self) {
    self.values.write().clear();
  }
}

impl<K: Eq + Hash + Clone> Default for MonotonicCounters<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> Clone for MonotonicCounters<K> {
  fn clone(&self) -> Self {
    Self {
      values: Arc::clone(&self.values),
    }
  }
}

/// Counters adjusted by fixed deltas (pending applications, interviews).
#[derive(Debug)]
pub struct DeltaCounters<K> {
  values: Arc<RwLock<HashMap<K, u64>>>,
}

impl<K: Eq + Hash + Clone> DeltaCounters<K> {
  pub fn new() -> Self {
    Self {
      values: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  /// Seed the counter with a server value.
  pub fn set(&self, key: K, value: u64) {
    self.values.write().insert(key, value);
  }

  pub fn increment(&self, key: K) -> u64 {
    let mut values = self.values.write();
    let value = values.entry(key).or_insert(0);
    *value += 1;
    *value
  }

  /// Decrement, stopping at zero.
  pub fn decrement(&self, key: K) -> u64 {
    let mut values = self.values.write();
    let value = values.entry(key).or_insert(0);
    *value = value.saturating_sub(1);
    *value
  }

  pub fn get(&self, key: &K) -> u64 {
    self.values.read().get(key).copied().unwrap_or(0)
  }

  pub fn clear(&self) {
    self.values.write().clear();
  }
}

impl<K: Eq + Hash + Clone> Default for DeltaCounters<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> Clone for DeltaCounters<K> {
  fn clone(&self) -> Self {
    Self {
      values: Arc::clone(&self.values),
    }
  }
}
