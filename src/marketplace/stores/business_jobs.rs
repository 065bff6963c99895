//! Jobs posted by the signed-in business, plus their counters.

use tokio::sync::watch;

use crate::cache::{
  CacheStore, DeltaCounters, EntityId, FetchOutcome, MonotonicCounters, Pagination, SnapshotCache,
};
use crate::marketplace::filters::BusinessJobFilter;
use crate::marketplace::types::{BusinessJob, JobStatus, PopularJobs};

use super::snapshot_outcome;

#[derive(Clone)]
pub struct BusinessJobStore {
  jobs: CacheStore<BusinessJobFilter, BusinessJob>,
  popular: SnapshotCache<PopularJobs>,
  views: MonotonicCounters<EntityId>,
  application_counts: MonotonicCounters<EntityId>,
  pending_applications: DeltaCounters<EntityId>,
  interview_counts: DeltaCounters<EntityId>,
}

impl BusinessJobStore {
  pub fn new(
    jobs: CacheStore<BusinessJobFilter, BusinessJob>,
    popular: SnapshotCache<PopularJobs>,
  ) -> Self {
    Self {
      jobs,
      popular,
      views: MonotonicCounters::new(),
      application_counts: MonotonicCounters::new(),
      pending_applications: DeltaCounters::new(),
      interview_counts: DeltaCounters::new(),
    }
  }

  pub async fn fetch_jobs_for_business_and_filter(
    &self,
    business_id: EntityId,
    filter: &BusinessJobFilter,
    page: u32,
  ) -> FetchOutcome {
    let outcome = self.jobs.fetch(Some(business_id), filter, page).await;
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      self.seed_counters(business_id, filter);
    }
    outcome
  }

  pub async fn fetch_next_jobs_page(
    &self,
    business_id: EntityId,
    filter: &BusinessJobFilter,
  ) -> FetchOutcome {
    let outcome = self.jobs.fetch_next_page(Some(business_id), filter).await;
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      self.seed_counters(business_id, filter);
    }
    outcome
  }

  pub async fn refresh_jobs(&self, business_id: EntityId, filter: &BusinessJobFilter) -> FetchOutcome {
    let outcome = self.jobs.refresh(Some(business_id), filter).await;
    if matches!(outcome, FetchOutcome::Loaded { .. }) {
      self.seed_counters(business_id, filter);
    }
    outcome
  }

  pub fn jobs(&self, business_id: EntityId, filter: &BusinessJobFilter) -> Option<Vec<BusinessJob>> {
    self.jobs.get(Some(business_id), filter)
  }

  pub fn is_loading_jobs(&self, business_id: EntityId, filter: &BusinessJobFilter) -> bool {
    self.jobs.is_loading(Some(business_id), filter)
  }

  pub fn has_valid_jobs_cache(&self, business_id: EntityId, filter: &BusinessJobFilter) -> bool {
    self.jobs.has_valid_cache(Some(business_id), filter)
  }

  pub fn total_jobs(&self, business_id: EntityId, filter: &BusinessJobFilter) -> u64 {
    self.jobs.total_count(Some(business_id), filter)
  }

  pub fn jobs_pagination(&self, business_id: EntityId, filter: &BusinessJobFilter) -> Pagination {
    self.jobs.pagination(Some(business_id), filter)
  }

  /// Load the most applied / most viewed breakdown unless it is still fresh.
  pub async fn fetch_most_popular(&self) -> FetchOutcome {
    snapshot_outcome("popular_jobs", self.popular.fetch().await)
  }

  pub async fn refresh_most_popular(&self) -> FetchOutcome {
    snapshot_outcome("popular_jobs", self.popular.refresh().await)
  }

  pub fn has_valid_popular_cache(&self) -> bool {
    self.popular.has_valid_cache()
  }

  pub fn most_applied_jobs(&self) -> Vec<BusinessJob> {
    self.popular.get().map(|p| p.most_applied).unwrap_or_default()
  }

  pub fn most_viewed_jobs(&self) -> Vec<BusinessJob> {
    self.popular.get().map(|p| p.most_viewed).unwrap_or_default()
  }

  /// Record a view count reported by the server. Lower values than the one
  /// already known are ignored.
  pub fn set_job_views(&self, job_id: EntityId, views: u64) -> u64 {
    self.views.set(job_id, views)
  }

  /// Best known view count: the recorded counter or any cached copy of the job.
  pub fn total_views(&self, job_id: EntityId) -> u64 {
    let cached = self
      .find_job(job_id)
      .map(|job| job.view_count)
      .unwrap_or(0);
    self.views.get(&job_id).unwrap_or(0).max(cached)
  }

  pub fn set_application_count(&self, job_id: EntityId, count: u64) -> u64 {
    self.application_counts.set(job_id, count)
  }

  pub fn application_count(&self, job_id: EntityId) -> u64 {
    self.application_counts.get(&job_id).unwrap_or(0)
  }

  /// A pending application was reviewed.
  pub fn decrement_pending_applications(&self, job_id: EntityId) -> u64 {
    let remaining = self.pending_applications.decrement(job_id);
    self.jobs.patch_entity(None, job_id, |job| {
      job.pending_application_count = remaining;
    });
    remaining
  }

  pub fn pending_applications(&self, job_id: EntityId) -> u64 {
    self.pending_applications.get(&job_id)
  }

  /// An interview was scheduled for one of the job's candidates.
  pub fn increment_interview_count(&self, job_id: EntityId) -> u64 {
    let count = self.interview_counts.increment(job_id);
    self.jobs.patch_entity(None, job_id, |job| job.interview_count = count);
    count
  }

  pub fn interview_count(&self, job_id: EntityId) -> u64 {
    self.interview_counts.get(&job_id)
  }

  /// Change a posting's status in every cached list of the business.
  pub fn update_job_status(&self, business_id: EntityId, job_id: EntityId, status: JobStatus) -> usize {
    self
      .jobs
      .patch_entity(Some(business_id), job_id, |job| job.status = status)
  }

  /// Drop a deleted posting from every cached list.
  pub fn remove_job(&self, job_id: EntityId) -> usize {
    self.jobs.remove_item(None, job_id)
  }

  pub fn clear(&self) {
    self.jobs.clear();
    self.popular.invalidate();
    self.views.clear();
    self.application_counts.clear();
    self.pending_applications.clear();
    self.interview_counts.clear();
  }

  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.jobs.subscribe()
  }

  fn find_job(&self, job_id: EntityId) -> Option<BusinessJob> {
    self.jobs.all_items().into_iter().find(|job| job.id == job_id)
  }

  /// Take the server's counts for every job in a freshly loaded list.
  fn seed_counters(&self, business_id: EntityId, filter: &BusinessJobFilter) {
    for job in self.jobs.get(Some(business_id), filter).unwrap_or_default() {
      self.views.set(job.id, job.view_count);
      self.application_counts.set(job.id, job.application_count);
      self.pending_applications.set(job.id, job.pending_application_count);
      self.interview_counts.set(job.id, job.interview_count);
    }
  }
}
