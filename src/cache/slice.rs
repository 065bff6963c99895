//! Cached state for a single key.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::traits::{Cacheable, EntityId, Page};

/// Pagination cursor of a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
  pub current_page: u32,
  pub has_more: bool,
}

/// Items, loading flag, cursor and timestamps for one cache key.
#[derive(Debug, Clone)]
pub struct Slice<T> {
  pub(crate) items: Vec<T>,
  pub(crate) loading: bool,
  pub(crate) pagination: Pagination,
  pub(crate) total_count: u64,
  pub(crate) last_fetched_at: Option<DateTime<Utc>>,
  /// Bumped whenever the slice is reset; results of fetches started under an
  /// older epoch are dropped.
  pub(crate) epoch: u64,
}

impl<T> Default for Slice<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      loading: false,
      pagination: Pagination::default(),
      total_count: 0,
      last_fetched_at: None,
      epoch: 0,
    }
  }
}

impl<T: Cacheable> Slice<T> {
  /// Forget everything about this key and move to the next epoch.
  pub(crate) fn reset(&mut self) {
    let epoch = self.epoch + 1;
    *self = Self {
      epoch,
      ..Self::default()
    };
  }

  /// Whether a fetch has ever succeeded since the last reset.
  pub(crate) fn is_populated(&self) -> bool {
    self.last_fetched_at.is_some()
  }

  /// Merge one fetched page.
  ///
  /// Page 0 replaces the accumulated items; later pages append, skipping ids
  /// already present.
  pub(crate) fn apply_page(&mut self, page: u32, data: Page<T>, now: DateTime<Utc>) {
    if page == 0 {
      self.items = data.content;
    } else {
      let mut seen: HashSet<EntityId> = self.items.iter().map(|item| item.entity_id()).collect();
      self
        .items
        .extend(data.content.into_iter().filter(|item| seen.insert(item.entity_id())));
    }

    self.total_count = data.total_elements.max(self.items.len() as u64);
    self.pagination = Pagination {
      current_page: page,
      has_more: data.has_more,
    };
    self.last_fetched_at = Some(now);
  }

  /// Remove an entity by id. Returns true if it was present.
  pub(crate) fn remove(&mut self, id: EntityId) -> bool {
    let before = self.items.len();
    self.items.retain(|item| item.entity_id() != id);
    let removed = before != self.items.len();
    if removed {
      self.total_count = self.total_count.saturating_sub(1);
    }
    removed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Item(i64);

  impl Cacheable for Item {
    fn entity_id(&self) -> EntityId {
      self.0
    }

    fn entity_type() -> &'static str {
      "item"
    }
  }

  fn ids(slice: &Slice<Item>) -> Vec<i64> {
    slice.items.iter().map(|i| i.0).collect()
  }

  #[test]
  fn test_page_zero_replaces() {
    let mut slice = Slice::default();
    slice.apply_page(0, Page::new(vec![Item(1), Item(2)], 2, false), Utc::now());
    slice.apply_page(0, Page::new(vec![Item(9)], 1, false), Utc::now());

    assert_eq!(ids(&slice), vec![9]);
    assert_eq!(slice.total_count, 1);
  }

  #[test]
  fn test_later_page_appends_without_duplicates() {
    let mut slice = Slice::default();
    slice.apply_page(0, Page::new(vec![Item(1), Item(2)], 4, true), Utc::now());
    slice.apply_page(1, Page::new(vec![Item(2), Item(3), Item(3)], 4, false), Utc::now());

    assert_eq!(ids(&slice), vec![1, 2, 3]);
    assert_eq!(
      slice.pagination,
      Pagination {
        current_page: 1,
        has_more: false
      }
    );
  }

  #[test]
  fn test_total_never_below_item_count() {
    let mut slice = Slice::default();
    slice.apply_page(0, Page::new(vec![Item(1), Item(2), Item(3)], 1, false), Utc::now());

    assert_eq!(slice.total_count, 3);
  }

  #[test]
  fn test_reset_bumps_epoch_and_clears() {
    let mut slice = Slice::default();
    slice.apply_page(0, Page::new(vec![Item(1)], 1, false), Utc::now());
    slice.loading = true;
    slice.reset();

    assert!(slice.items.is_empty());
    assert!(!slice.loading);
    assert!(!slice.is_populated());
    assert_eq!(slice.epoch, 1);
  }

  #[test]
  fn test_remove_decrements_total() {
    let mut slice = Slice::default();
    slice.apply_page(0, Page::new(vec![Item(1), Item(2)], 10, true), Utc::now());

    assert!(slice.remove(1));
    assert!(!slice.remove(1));
    assert_eq!(ids(&slice), vec![2]);
    assert_eq!(slice.total_count, 9);
  }
}
