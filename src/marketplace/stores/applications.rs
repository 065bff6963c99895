//! Applications received for each of a business's jobs.

use tokio::sync::watch;
use tracing::debug;

use crate::cache::{CacheStore, EntityId, FetchOutcome, MembershipSet, Pagination};
use crate::marketplace::filters::ApplicationFilter;
use crate::marketplace::types::{Application, ApplicationStatus};

#[derive(Clone)]
pub struct ApplicationStore {
  applications: CacheStore<ApplicationFilter, Application>,
  /// (job id, candidate id)
  shortlist: MembershipSet<(EntityId, EntityId)>,
}

impl ApplicationStore {
  pub fn new(applications: CacheStore<ApplicationFilter, Application>) -> Self {
    Self {
      applications,
      shortlist: MembershipSet::new(),
    }
  }

  pub async fn fetch_applications_for_job_and_filter(
    &self,
    job_id: EntityId,
    filter: &ApplicationFilter,
    page: u32,
  ) -> FetchOutcome {
    let outcome = self.applications.fetch(Some(job_id), filter, page).await;
    self.after_load(outcome, job_id, filter)
  }

  pub async fn fetch_next_applications_page(
    &self,
    job_id: EntityId,
    filter: &ApplicationFilter,
  ) -> FetchOutcome {
    let outcome = self.applications.fetch_next_page(Some(job_id), filter).await;
    self.after_load(outcome, job_id, filter)
  }

  pub async fn refresh_applications(&self, job_id: EntityId, filter: &ApplicationFilter) -> FetchOutcome {
    let outcome = self.applications.refresh(Some(job_id), filter).await;
    self.after_load(outcome, job_id, filter)
  }

  pub fn applications(&self, job_id: EntityId, filter: &ApplicationFilter) -> Option<Vec<Application>> {
    self.applications.get(Some(job_id), filter)
  }

  pub fn is_loading_applications(&self, job_id: EntityId, filter: &ApplicationFilter) -> bool {
    self.applications.is_loading(Some(job_id), filter)
  }

  pub fn has_valid_applications_cache(&self, job_id: EntityId, filter: &ApplicationFilter) -> bool {
    self.applications.has_valid_cache(Some(job_id), filter)
  }

  pub fn total_applications(&self, job_id: EntityId, filter: &ApplicationFilter) -> u64 {
    self.applications.total_count(Some(job_id), filter)
  }

  pub fn applications_pagination(&self, job_id: EntityId, filter: &ApplicationFilter) -> Pagination {
    self.applications.pagination(Some(job_id), filter)
  }

  /// Cached applications of a job that still await review.
  pub fn pending_applications(&self, job_id: EntityId) -> Vec<Application> {
    self
      .applications
      .all_items()
      .into_iter()
      .filter(|app| app.job_id == job_id && app.status.is_pending())
      .collect()
  }

  /// Set an application's status in every cached list of its job. Lists of
  /// other jobs are never touched. Keeps the shortlist in step.
  pub fn update_application_status(
    &self,
    job_id: EntityId,
    application_id: EntityId,
    status: ApplicationStatus,
  ) -> usize {
    let mut candidate = None;
    let patched = self
      .applications
      .patch_entity(Some(job_id), application_id, |app| {
        app.status = status;
        candidate = Some(app.candidate_id);
      });

    if let Some(candidate_id) = candidate {
      if status == ApplicationStatus::Shortlisted {
        self.shortlist.insert((job_id, candidate_id));
      } else {
        self.shortlist.remove(&(job_id, candidate_id));
      }
    }
    debug!(job_id, application_id, %status, patched, "application status updated");
    patched
  }

  pub fn shortlist_candidate(&self, job_id: EntityId, candidate_id: EntityId) -> bool {
    self.shortlist.insert((job_id, candidate_id))
  }

  pub fn remove_from_shortlist(&self, job_id: EntityId, candidate_id: EntityId) -> bool {
    self.shortlist.remove(&(job_id, candidate_id))
  }

  pub fn is_candidate_shortlisted(&self, job_id: EntityId, candidate_id: EntityId) -> bool {
    self.shortlist.contains(&(job_id, candidate_id))
  }

  /// Forget every cached list of one job.
  pub fn invalidate_job(&self, job_id: EntityId) {
    self.applications.invalidate_scope(job_id);
  }

  pub fn clear(&self) {
    self.applications.clear();
    self.shortlist.clear();
  }

  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.applications.subscribe()
  }

  /// Loaded applications are authoritative for their candidates' shortlist state.
  fn after_load(&self, outcome: FetchOutcome, job_id: EntityId, filter: &ApplicationFilter) -> FetchOutcome {
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      for app in self.applications.get(Some(job_id), filter).unwrap_or_default() {
        let key = (job_id, app.candidate_id);
        if app.status == ApplicationStatus::Shortlisted {
          self.shortlist.insert(key);
        } else {
          self.shortlist.remove(&key);
        }
      }
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{fetcher, Page, PageRequest};
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  fn application(id: EntityId, job_id: EntityId, status: ApplicationStatus) -> Application {
    Application {
      id,
      job_id,
      candidate_id: id * 100,
      candidate_name: format!("Candidate {}", id),
      status,
      applied_at: None,
    }
  }

  fn store() -> ApplicationStore {
    ApplicationStore::new(CacheStore::new(
      "applications",
      fetcher(|req: PageRequest<ApplicationFilter>| async move {
        let job = req.scope.unwrap_or_default();
        Ok(Page::new(
          vec![
            application(job * 10 + 1, job, ApplicationStatus::Pending),
            application(job * 10 + 2, job, ApplicationStatus::Shortlisted),
          ],
          2,
          false,
        ))
      }),
    ))
  }

  #[tokio::test]
  async fn test_status_update_is_scoped_to_job() {
    let store = store();
    let all = ApplicationFilter::default();
    let pending = ApplicationFilter {
      statuses: vec![ApplicationStatus::Pending],
      ..Default::default()
    };
    store.fetch_applications_for_job_and_filter(7, &all, 0).await;
    store.fetch_applications_for_job_and_filter(7, &pending, 0).await;
    store.fetch_applications_for_job_and_filter(8, &all, 0).await;

    let patched = store.update_application_status(7, 71, ApplicationStatus::Reviewed);

    assert_eq!(patched, 2);
    assert_eq!(store.applications(7, &all).unwrap()[0].status, ApplicationStatus::Reviewed);
    assert_eq!(store.applications(8, &all).unwrap()[0].status, ApplicationStatus::Pending);
  }

  #[tokio::test]
  async fn test_loaded_shortlist_is_remembered() {
    let store = store();
    store
      .fetch_applications_for_job_and_filter(7, &ApplicationFilter::default(), 0)
      .await;

    assert!(store.is_candidate_shortlisted(7, 7200));
    assert!(!store.is_candidate_shortlisted(7, 7100));
    assert!(!store.is_candidate_shortlisted(8, 7200));
  }

  #[tokio::test]
  async fn test_status_update_tracks_shortlist() {
    let store = store();
    store
      .fetch_applications_for_job_and_filter(7, &ApplicationFilter::default(), 0)
      .await;

    store.update_application_status(7, 71, ApplicationStatus::Shortlisted);
    assert!(store.is_candidate_shortlisted(7, 7100));

    store.update_application_status(7, 72, ApplicationStatus::Rejected);
    assert!(!store.is_candidate_shortlisted(7, 7200));
  }

  #[tokio::test]
  async fn test_manual_shortlist() {
    let store = store();

    assert!(store.shortlist_candidate(3, 42));
    assert!(!store.shortlist_candidate(3, 42));
    assert!(store.is_candidate_shortlisted(3, 42));
    assert!(store.remove_from_shortlist(3, 42));
    assert!(!store.is_candidate_shortlisted(3, 42));
  }

  #[tokio::test]
  async fn test_pending_applications_per_job() {
    let store = store();
    store
      .fetch_applications_for_job_and_filter(7, &ApplicationFilter::default(), 0)
      .await;
    store
      .fetch_applications_for_job_and_filter(8, &ApplicationFilter::default(), 0)
      .await;

    store.update_application_status(8, 81, ApplicationStatus::Reviewed);

    let pending = store.pending_applications(7);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, 71);
    assert!(store.pending_applications(8).is_empty());
  }

  #[tokio::test]
  async fn test_invalidate_job() {
    let store = store();
    let filter = ApplicationFilter::default();
    store.fetch_applications_for_job_and_filter(7, &filter, 0).await;
    store.fetch_applications_for_job_and_filter(8, &filter, 0).await;

    store.invalidate_job(7);

    assert!(store.applications(7, &filter).is_none());
    assert!(store.applications(8, &filter).is_some());
  }

  #[tokio::test]
  async fn test_reload_drops_candidates_no_longer_shortlisted() {
    let shortlisted = Arc::new(AtomicBool::new(true));
    let store = {
      let shortlisted = shortlisted.clone();
      ApplicationStore::new(CacheStore::new(
        "applications",
        fetcher(move |req: PageRequest<ApplicationFilter>| {
          let status = if shortlisted.load(Ordering::SeqCst) {
            ApplicationStatus::Shortlisted
          } else {
            ApplicationStatus::Rejected
          };
          async move {
            let job = req.scope.unwrap_or_default();
            Ok(Page::new(vec![application(job * 10 + 1, job, status)], 1, false))
          }
        }),
      ))
    };
    let filter = ApplicationFilter::default();

    store.fetch_applications_for_job_and_filter(7, &filter, 0).await;
    assert!(store.is_candidate_shortlisted(7, 7100));

    shortlisted.store(false, Ordering::SeqCst);
    store.refresh_applications(7, &filter).await;

    assert!(!store.is_candidate_shortlisted(7, 7100));
  }
}
