//! Filter key encoding.
//!
//! Every list cache is partitioned by the shape of the query that produced it.
//! A filter is encoded into a string by walking its fields in declaration order:
//!
//! - list fields are sorted and joined with `,`
//! - scalar fields are stringified, absent ones replaced by a default token
//! - all parts are joined with `-`
//!
//! Two filters with the same values encode to the same key regardless of the
//! order their list fields were built in. Because parts are joined with plain
//! separators, values that themselves contain `-` or `,` can collide with other
//! filters. The filter space is small and fixed, so this is accepted.

use sha2::{Digest, Sha256};
use std::fmt;

use super::traits::EntityId;

/// A query object that partitions a cache.
pub trait FilterKey: Clone + Send + Sync + 'static {
  /// Stable string key for this filter. Must be pure.
  fn encode(&self) -> String;
}

/// Filter for collections that take no query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

impl FilterKey for NoFilter {
  fn encode(&self) -> String {
    String::new()
  }
}

/// Accumulates the parts of an encoded key.
#[derive(Debug, Default)]
pub struct KeyBuilder {
  parts: Vec<String>,
}

impl KeyBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// List field: order-insensitive.
  pub fn list<S: AsRef<str>>(mut self, values: &[S]) -> Self {
    let mut sorted: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    self.parts.push(sorted.join(","));
    self
  }

  /// Free-text field, taken as is.
  pub fn text(mut self, value: &str) -> Self {
    self.parts.push(value.to_string());
    self
  }

  /// Optional scalar, empty when absent.
  pub fn opt<V: ToString>(self, value: Option<V>) -> Self {
    self.opt_or(value, "")
  }

  /// Optional scalar with an explicit default token (e.g. `"any"`).
  pub fn opt_or<V: ToString>(mut self, value: Option<V>, default: &str) -> Self {
    self
      .parts
      .push(value.map(|v| v.to_string()).unwrap_or_else(|| default.to_string()));
    self
  }

  pub fn flag(mut self, value: bool) -> Self {
    self.parts.push(if value { "1" } else { "0" }.to_string());
    self
  }

  pub fn finish(self) -> String {
    self.parts.join("-")
  }
}

/// Address of one cached slice: the encoded filter, optionally under a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SliceKey {
  pub scope: Option<EntityId>,
  pub filter: String,
}

impl SliceKey {
  pub fn new<Q: FilterKey>(scope: Option<EntityId>, filter: &Q) -> Self {
    Self {
      scope,
      filter: filter.encode(),
    }
  }

  /// Short stable digest for log fields, so long filter strings stay out of the logs.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..6])
  }
}

impl fmt::Display for SliceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.scope {
      Some(scope) => write!(f, "{}-{}", scope, self.filter),
      None => f.write_str(&self.filter),
    }
  }
}
