//! Everything a job seeker browses: search results, their own applications,
//! favorites and recommendations.

use tokio::sync::watch;
use tracing::debug;

use crate::cache::{
  CacheStore, EntityId, FetchOutcome, MembershipSet, MonotonicCounters, NoFilter, Pagination,
  SnapshotCache,
};
use crate::marketplace::filters::{AppliedJobFilter, JobFilter};
use crate::marketplace::types::{AppliedJob, ApplicationStatus, JobListing};

use super::snapshot_outcome;

#[derive(Clone)]
pub struct UserJobStore {
  listings: CacheStore<JobFilter, JobListing>,
  applied: CacheStore<AppliedJobFilter, AppliedJob>,
  favorites: CacheStore<NoFilter, JobListing>,
  recommendations: SnapshotCache<Vec<JobListing>>,
  favorite_ids: MembershipSet<EntityId>,
  applied_ids: MembershipSet<EntityId>,
  application_counts: MonotonicCounters<EntityId>,
}

impl UserJobStore {
  pub fn new(
    listings: CacheStore<JobFilter, JobListing>,
    applied: CacheStore<AppliedJobFilter, AppliedJob>,
    favorites: CacheStore<NoFilter, JobListing>,
    recommendations: SnapshotCache<Vec<JobListing>>,
  ) -> Self {
    Self {
      listings,
      applied,
      favorites,
      recommendations,
      favorite_ids: MembershipSet::new(),
      applied_ids: MembershipSet::new(),
      application_counts: MonotonicCounters::new(),
    }
  }

  // ==========================================================================
  // Search results
  // ==========================================================================

  pub async fn fetch_jobs_for_filter(&self, filter: &JobFilter, page: u32) -> FetchOutcome {
    let outcome = self.listings.fetch(None, filter, page).await;
    self.seed_listing_counts(outcome, filter)
  }

  pub async fn fetch_next_jobs_page(&self, filter: &JobFilter) -> FetchOutcome {
    let outcome = self.listings.fetch_next_page(None, filter).await;
    self.seed_listing_counts(outcome, filter)
  }

  pub async fn refresh_jobs(&self, filter: &JobFilter) -> FetchOutcome {
    let outcome = self.listings.refresh(None, filter).await;
    self.seed_listing_counts(outcome, filter)
  }

  pub fn jobs(&self, filter: &JobFilter) -> Option<Vec<JobListing>> {
    self.listings.get(None, filter)
  }

  pub fn is_loading_jobs(&self, filter: &JobFilter) -> bool {
    self.listings.is_loading(None, filter)
  }

  pub fn has_valid_jobs_cache(&self, filter: &JobFilter) -> bool {
    self.listings.has_valid_cache(None, filter)
  }

  pub fn total_jobs(&self, filter: &JobFilter) -> u64 {
    self.listings.total_count(None, filter)
  }

  pub fn jobs_pagination(&self, filter: &JobFilter) -> Pagination {
    self.listings.pagination(None, filter)
  }

  pub fn set_application_count(&self, job_id: EntityId, count: u64) -> u64 {
    self.application_counts.set(job_id, count)
  }

  pub fn application_count(&self, job_id: EntityId) -> u64 {
    self.application_counts.get(&job_id).unwrap_or(0)
  }

  // ==========================================================================
  // Applied jobs
  // ==========================================================================

  pub async fn fetch_applied_jobs(&self, filter: &AppliedJobFilter, page: u32) -> FetchOutcome {
    let outcome = self.applied.fetch(None, filter, page).await;
    self.track_applied(outcome, filter)
  }

  pub async fn fetch_next_applied_page(&self, filter: &AppliedJobFilter) -> FetchOutcome {
    let outcome = self.applied.fetch_next_page(None, filter).await;
    self.track_applied(outcome, filter)
  }

  pub async fn refresh_applied_jobs(&self, filter: &AppliedJobFilter) -> FetchOutcome {
    let outcome = self.applied.refresh(None, filter).await;
    self.track_applied(outcome, filter)
  }

  pub fn applied_jobs(&self, filter: &AppliedJobFilter) -> Option<Vec<AppliedJob>> {
    self.applied.get(None, filter)
  }

  pub fn is_loading_applied(&self, filter: &AppliedJobFilter) -> bool {
    self.applied.is_loading(None, filter)
  }

  pub fn has_valid_applied_cache(&self, filter: &AppliedJobFilter) -> bool {
    self.applied.has_valid_cache(None, filter)
  }

  pub fn total_applied(&self, filter: &AppliedJobFilter) -> u64 {
    self.applied.total_count(None, filter)
  }

  pub fn has_applied(&self, job_id: EntityId) -> bool {
    self.applied_ids.contains(&job_id)
  }

  /// Record a successful application: the unfiltered applied list gains it
  /// and the job's application count goes up by one.
  pub fn record_application(&self, applied: AppliedJob) -> bool {
    let job_id = applied.job_id;
    if !self.applied_ids.insert(job_id) {
      return false;
    }

    self
      .applied
      .prepend_item(None, &AppliedJobFilter::default(), applied);

    let mut bumped = None;
    self.listings.patch_entity(None, job_id, |job| {
      job.application_count += 1;
      bumped = Some(job.application_count);
    });
    let count = bumped.unwrap_or_else(|| self.application_count(job_id) + 1);
    self.application_counts.set(job_id, count);

    debug!(job_id, "application recorded");
    true
  }

  /// Mark the seeker's application to a job as withdrawn wherever it is cached.
  pub fn withdraw_application(&self, job_id: EntityId) -> usize {
    self
      .applied
      .patch_entity(None, job_id, |applied| applied.status = ApplicationStatus::Withdrawn)
  }

  // ==========================================================================
  // Favorites
  // ==========================================================================

  pub async fn fetch_favorites(&self, page: u32) -> FetchOutcome {
    let outcome = self.favorites.fetch(None, &NoFilter, page).await;
    self.sync_favorite_ids(outcome)
  }

  pub async fn fetch_next_favorites_page(&self) -> FetchOutcome {
    let outcome = self.favorites.fetch_next_page(None, &NoFilter).await;
    self.sync_favorite_ids(outcome)
  }

  pub async fn refresh_favorites(&self) -> FetchOutcome {
    let outcome = self.favorites.refresh(None, &NoFilter).await;
    self.sync_favorite_ids(outcome)
  }

  pub fn favorites(&self) -> Option<Vec<JobListing>> {
    self.favorites.get(None, &NoFilter)
  }

  pub fn has_valid_favorites_cache(&self) -> bool {
    self.favorites.has_valid_cache(None, &NoFilter)
  }

  pub fn is_favorite(&self, job_id: EntityId) -> bool {
    self.favorite_ids.contains(&job_id)
  }

  pub fn add_favorite(&self, job: JobListing) -> bool {
    if !self.favorite_ids.insert(job.id) {
      return false;
    }
    self.favorites.prepend_item(None, &NoFilter, job);
    true
  }

  pub fn remove_favorite(&self, job_id: EntityId) -> bool {
    if !self.favorite_ids.remove(&job_id) {
      return false;
    }
    self.favorites.remove_item(None, job_id);
    true
  }

  // ==========================================================================
  // Recommendations
  // ==========================================================================

  pub async fn fetch_recommendations(&self) -> FetchOutcome {
    snapshot_outcome("recommendations", self.recommendations.fetch().await)
  }

  pub async fn refresh_recommendations(&self) -> FetchOutcome {
    snapshot_outcome("recommendations", self.recommendations.refresh().await)
  }

  pub fn recommendations(&self) -> Vec<JobListing> {
    self.recommendations.get().unwrap_or_default()
  }

  pub fn has_valid_recommendations_cache(&self) -> bool {
    self.recommendations.has_valid_cache()
  }

  pub fn clear(&self) {
    self.listings.clear();
    self.applied.clear();
    self.favorites.clear();
    self.recommendations.invalidate();
    self.favorite_ids.clear();
    self.applied_ids.clear();
    self.application_counts.clear();
  }

  pub fn subscribe_jobs(&self) -> watch::Receiver<u64> {
    self.listings.subscribe()
  }

  pub fn subscribe_favorites(&self) -> watch::Receiver<u64> {
    self.favorites.subscribe()
  }

  fn seed_listing_counts(&self, outcome: FetchOutcome, filter: &JobFilter) -> FetchOutcome {
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      for job in self.listings.get(None, filter).unwrap_or_default() {
        self.application_counts.set(job.id, job.application_count);
      }
    }
    outcome
  }

  fn track_applied(&self, outcome: FetchOutcome, filter: &AppliedJobFilter) -> FetchOutcome {
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      let ids = self
        .applied
        .get(None, filter)
        .unwrap_or_default()
        .into_iter()
        .map(|applied| applied.job_id);
      self.applied_ids.extend(ids);
    }
    outcome
  }

  /// A complete favorites list replaces the known ids; a partial one only
  /// adds to them.
  fn sync_favorite_ids(&self, outcome: FetchOutcome) -> FetchOutcome {
    if let FetchOutcome::Loaded { has_more, .. } = outcome {
      let ids: Vec<EntityId> = self
        .favorites
        .get(None, &NoFilter)
        .unwrap_or_default()
        .into_iter()
        .map(|job| job.id)
        .collect();
      if has_more {
        self.favorite_ids.extend(ids);
      } else {
        self.favorite_ids.replace_all(ids);
      }
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{fetcher, lister, Page, PageRequest};
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::sync::Notify;

  fn listing(id: EntityId) -> JobListing {
    JobListing {
      id,
      title: format!("Listing {}", id),
      company_name: "Acme".to_string(),
      location: Some("Berlin".to_string()),
      tags: vec![],
      min_salary: None,
      max_salary: None,
      experience: None,
      application_count: 4,
      view_count: 0,
      posted_at: None,
    }
  }

  fn applied(job_id: EntityId) -> AppliedJob {
    AppliedJob {
      application_id: job_id * 10,
      job_id,
      title: format!("Listing {}", job_id),
      company_name: "Acme".to_string(),
      status: ApplicationStatus::Pending,
      applied_at: None,
    }
  }

  fn store() -> UserJobStore {
    with_recommendations(SnapshotCache::new(
      "recommendations",
      lister(|| async { Ok(vec![listing(5)]) }),
    ))
  }

  fn with_recommendations(recommendations: SnapshotCache<Vec<JobListing>>) -> UserJobStore {
    UserJobStore::new(
      CacheStore::new(
        "user_jobs",
        fetcher(|_req: PageRequest<JobFilter>| async {
          Ok(Page::new(vec![listing(1), listing(2)], 2, false))
        }),
      ),
      CacheStore::new(
        "applied_jobs",
        fetcher(|_req: PageRequest<AppliedJobFilter>| async {
          Ok(Page::new(vec![applied(2)], 1, false))
        }),
      ),
      CacheStore::new(
        "favorites",
        fetcher(|req: PageRequest<NoFilter>| async move {
          let id = req.page as EntityId + 10;
          Ok(Page::new(vec![listing(id)], 3, req.page < 2))
        }),
      ),
      recommendations,
    )
  }

  #[tokio::test]
  async fn test_search_results_seed_application_counts() {
    let store = store();
    let filter = JobFilter::default();

    store.fetch_jobs_for_filter(&filter, 0).await;

    assert_eq!(store.jobs(&filter).unwrap().len(), 2);
    assert_eq!(store.application_count(1), 4);
    assert_eq!(store.set_application_count(1, 2), 4);
  }

  #[tokio::test]
  async fn test_applied_jobs_drive_has_applied() {
    let store = store();

    assert!(!store.has_applied(2));
    store.fetch_applied_jobs(&AppliedJobFilter::default(), 0).await;
    assert!(store.has_applied(2));
    assert!(!store.has_applied(1));
  }

  #[tokio::test]
  async fn test_record_application() {
    let store = store();
    let filter = JobFilter::default();
    store.fetch_jobs_for_filter(&filter, 0).await;
    store.fetch_applied_jobs(&AppliedJobFilter::default(), 0).await;

    assert!(store.record_application(applied(1)));
    assert!(!store.record_application(applied(1)));

    assert!(store.has_applied(1));
    let list = store.applied_jobs(&AppliedJobFilter::default()).unwrap();
    assert_eq!(list[0].job_id, 1);
    assert_eq!(list.len(), 2);
    assert_eq!(store.application_count(1), 5);
    assert_eq!(store.jobs(&filter).unwrap()[0].application_count, 5);
  }

  #[tokio::test]
  async fn test_withdraw_application() {
    let store = store();
    store.fetch_applied_jobs(&AppliedJobFilter::default(), 0).await;

    assert_eq!(store.withdraw_application(2), 1);
    assert_eq!(
      store.applied_jobs(&AppliedJobFilter::default()).unwrap()[0].status,
      ApplicationStatus::Withdrawn
    );
  }

  #[tokio::test]
  async fn test_favorite_ids_follow_pages() {
    let store = store();

    store.fetch_favorites(0).await;
    store.fetch_next_favorites_page().await;
    assert!(store.is_favorite(10));
    assert!(store.is_favorite(11));

    store.add_favorite(listing(99));
    store.fetch_next_favorites_page().await;

    // Last page loaded: ids are rebuilt from the complete list
    assert!(store.is_favorite(12));
    assert!(store.is_favorite(99));
    assert_eq!(store.favorites().unwrap().len(), 4);
  }

  #[tokio::test]
  async fn test_add_and_remove_favorite() {
    let store = store();
    store.fetch_favorites(0).await;

    assert!(store.add_favorite(listing(42)));
    assert!(!store.add_favorite(listing(42)));
    assert_eq!(store.favorites().unwrap()[0].id, 42);

    assert!(store.remove_favorite(42));
    assert!(!store.is_favorite(42));
    assert!(store.favorites().unwrap().iter().all(|job| job.id != 42));
    assert!(!store.remove_favorite(42));
  }

  #[tokio::test]
  async fn test_recommendations() {
    let store = store();

    assert!(store.recommendations().is_empty());
    store.fetch_recommendations().await;
    assert_eq!(store.recommendations()[0].id, 5);
    assert!(store.has_valid_recommendations_cache());
  }

  #[tokio::test]
  async fn test_failed_recommendations_keep_nothing() {
    let store = UserJobStore::new(
      CacheStore::new(
        "user_jobs",
        fetcher(|_req: PageRequest<JobFilter>| async { Err(eyre!("offline")) }),
      ),
      CacheStore::new(
        "applied_jobs",
        fetcher(|_req: PageRequest<AppliedJobFilter>| async { Err(eyre!("offline")) }),
      ),
      CacheStore::new(
        "favorites",
        fetcher(|_req: PageRequest<NoFilter>| async { Err(eyre!("offline")) }),
      ),
      SnapshotCache::new("recommendations", lister(|| async { Err(eyre!("offline")) })),
    );

    assert_eq!(store.fetch_recommendations().await, FetchOutcome::Failed);
    assert_eq!(store.fetch_jobs_for_filter(&JobFilter::default(), 0).await, FetchOutcome::Failed);
    assert!(store.jobs(&JobFilter::default()).is_none());
  }

  #[tokio::test]
  async fn test_recommendation_refresh_during_load() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let store = {
      let gate = gate.clone();
      let calls = calls.clone();
      with_recommendations(SnapshotCache::new(
        "recommendations",
        lister(move || {
          let gate = gate.clone();
          let call = calls.fetch_add(1, Ordering::SeqCst);
          async move {
            if call == 0 {
              gate.notified().await;
              Ok(vec![listing(1)])
            } else {
              Ok(vec![listing(2)])
            }
          }
        }),
      ))
    };

    let first = {
      let store = store.clone();
      tokio::spawn(async move { store.fetch_recommendations().await })
    };
    while calls.load(Ordering::SeqCst) == 0 {
      tokio::task::yield_now().await;
    }

    assert_eq!(store.fetch_recommendations().await, FetchOutcome::InFlight);
    assert!(matches!(
      store.refresh_recommendations().await,
      FetchOutcome::Loaded { .. }
    ));
    gate.notify_one();

    assert_eq!(first.await.unwrap(), FetchOutcome::Superseded);
    assert_eq!(store.recommendations()[0].id, 2);
  }
}
