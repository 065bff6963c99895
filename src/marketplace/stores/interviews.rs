use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::cache::{CacheStore, EntityId, FetchOutcome, Pagination};
use crate::marketplace::filters::InterviewFilter;
use crate::marketplace::types::{Interview, InterviewStatus};

/// Scheduled interviews, for either side of the marketplace.
#[derive(Clone)]
pub struct InterviewStore {
  interviews: CacheStore<InterviewFilter, Interview>,
}

impl InterviewStore {
  pub fn new(interviews: CacheStore<InterviewFilter, Interview>) -> Self {
    Self { interviews }
  }

  pub async fn fetch_interviews(&self, filter: &InterviewFilter, page: u32) -> FetchOutcome {
    self.interviews.fetch(None, filter, page).await
  }

  pub async fn fetch_next_interviews_page(&self, filter: &InterviewFilter) -> FetchOutcome {
    self.interviews.fetch_next_page(None, filter).await
  }

  pub async fn refresh_interviews(&self, filter: &InterviewFilter) -> FetchOutcome {
    self.interviews.refresh(None, filter).await
  }

  pub fn interviews(&self, filter: &InterviewFilter) -> Option<Vec<Interview>> {
    self.interviews.get(None, filter)
  }

  pub fn is_loading_interviews(&self, filter: &InterviewFilter) -> bool {
    self.interviews.is_loading(None, filter)
  }

  pub fn has_valid_interviews_cache(&self, filter: &InterviewFilter) -> bool {
    self.interviews.has_valid_cache(None, filter)
  }

  pub fn total_interviews(&self, filter: &InterviewFilter) -> u64 {
    self.interviews.total_count(None, filter)
  }

  pub fn interviews_pagination(&self, filter: &InterviewFilter) -> Pagination {
    self.interviews.pagination(None, filter)
  }

  /// Cached interviews still to happen after `now`, soonest first.
  pub fn upcoming_interviews(&self, now: DateTime<Utc>) -> Vec<Interview> {
    let mut upcoming: Vec<Interview> = self
      .interviews
      .all_items()
      .into_iter()
      .filter(|i| i.scheduled_at > now)
      .filter(|i| matches!(i.status, InterviewStatus::Scheduled | InterviewStatus::Rescheduled))
      .collect();
    upcoming.sort_by_key(|i| i.scheduled_at);
    upcoming
  }

  /// Add a newly scheduled interview to the unfiltered list, if cached.
  pub fn record_scheduled(&self, interview: Interview) -> bool {
    self
      .interviews
      .prepend_item(None, &InterviewFilter::default(), interview)
  }

  pub fn reschedule_interview(&self, interview_id: EntityId, at: DateTime<Utc>) -> usize {
    self.interviews.patch_entity(None, interview_id, |i| {
      i.scheduled_at = at;
      i.status = InterviewStatus::Rescheduled;
    })
  }

  pub fn cancel_interview(&self, interview_id: EntityId) -> usize {
    self.set_status(interview_id, InterviewStatus::Cancelled)
  }

  pub fn complete_interview(&self, interview_id: EntityId) -> usize {
    self.set_status(interview_id, InterviewStatus::Completed)
  }

  pub fn clear(&self) {
    self.interviews.clear();
  }

  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.interviews.subscribe()
  }

  fn set_status(&self, interview_id: EntityId, status: InterviewStatus) -> usize {
    self
      .interviews
      .patch_entity(None, interview_id, |i| i.status = status)
  }
}
