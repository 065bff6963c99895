//! Per-domain stores built on the generic cache engine.
//!
//! Each store binds one or more [`CacheStore`](crate::cache::CacheStore)s to
//! marketplace endpoints and adds the local mutators and derived getters its
//! screens need.

mod applications;
mod business_jobs;
mod conversations;
mod interviews;
mod user_jobs;

pub use applications::ApplicationStore;
pub use business_jobs::BusinessJobStore;
pub use conversations::ConversationStore;
pub use interviews::InterviewStore;
pub use user_jobs::UserJobStore;

use color_eyre::Result;
use tracing::warn;

use crate::cache::{CacheSource, FetchOutcome, SnapshotFetch};

/// Collapse a snapshot fetch into the same outcome type paged fetches use.
/// Errors are logged and swallowed.
fn snapshot_outcome<T>(name: &str, result: Result<SnapshotFetch<T>>) -> FetchOutcome {
  match result {
    Ok(SnapshotFetch::Ready(result)) => match result.source {
      CacheSource::Network => FetchOutcome::Loaded {
        page: 0,
        has_more: false,
      },
      CacheSource::CacheFresh => FetchOutcome::Fresh,
      CacheSource::Offline => FetchOutcome::Failed,
    },
    Ok(SnapshotFetch::InFlight) => FetchOutcome::InFlight,
    Ok(SnapshotFetch::Superseded) => FetchOutcome::Superseded,
    Err(error) => {
      warn!(cache = name, error = %error, "fetch failed");
      FetchOutcome::Failed
    }
  }
}
