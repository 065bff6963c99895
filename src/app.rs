use color_eyre::eyre::eyre;
use std::sync::Arc;
use tracing::info;

use crate::cache::{fetcher, lister, CacheStore, Clock, NoFilter, PageRequest, SnapshotCache, SystemClock};
use crate::config::{ttl, Config};
use crate::marketplace::filters::{
  ApplicationFilter, AppliedJobFilter, BusinessJobFilter, ConversationFilter, InterviewFilter,
  JobFilter,
};
use crate::marketplace::stores::{
  ApplicationStore, BusinessJobStore, ConversationStore, InterviewStore, UserJobStore,
};
use crate::marketplace::MarketplaceClient;

/// Every store the application uses, built once at startup.
///
/// Cloning is cheap; clones share the same cached state.
#[derive(Clone)]
pub struct AppStores {
  pub business_jobs: BusinessJobStore,
  pub applications: ApplicationStore,
  pub user_jobs: UserJobStore,
  pub interviews: InterviewStore,
  pub conversations: ConversationStore,
}

impl AppStores {
  pub fn new(config: &Config, client: MarketplaceClient) -> Self {
    Self::with_clock(config, client, Arc::new(SystemClock))
  }

  pub fn with_clock(config: &Config, client: MarketplaceClient, clock: Arc<dyn Clock>) -> Self {
    let page_size = config.page_size;
    let ttls = &config.ttl;

    let c = client.clone();
    let business_jobs = CacheStore::new(
      "business_jobs",
      fetcher(move |req: PageRequest<BusinessJobFilter>| {
        let c = c.clone();
        async move { c.business_jobs(req).await }
      }),
    )
    .with_ttl(ttl(ttls.business_jobs))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client.clone();
    let business_id = config.business_id;
    let popular = SnapshotCache::new(
      "popular_jobs",
      lister(move || {
        let c = c.clone();
        async move {
          match business_id {
            Some(id) => c.popular_jobs(id).await,
            None => Err(eyre!("No business_id configured")),
          }
        }
      }),
    )
    .with_ttl(ttl(ttls.popular_jobs))
    .with_clock(clock.clone());

    let c = client.clone();
    let applications = CacheStore::new(
      "applications",
      fetcher(move |req: PageRequest<ApplicationFilter>| {
        let c = c.clone();
        async move { c.job_applications(req).await }
      }),
    )
    .with_ttl(ttl(ttls.applications))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client.clone();
    let listings = CacheStore::new(
      "user_jobs",
      fetcher(move |req: PageRequest<JobFilter>| {
        let c = c.clone();
        async move { c.search_jobs(req).await }
      }),
    )
    .with_ttl(ttl(ttls.user_jobs))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client.clone();
    let applied = CacheStore::new(
      "applied_jobs",
      fetcher(move |req: PageRequest<AppliedJobFilter>| {
        let c = c.clone();
        async move { c.applied_jobs(req).await }
      }),
    )
    .with_ttl(ttl(ttls.applied_jobs))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client.clone();
    let favorites = CacheStore::new(
      "favorites",
      fetcher(move |req: PageRequest<NoFilter>| {
        let c = c.clone();
        async move { c.favorite_jobs(req).await }
      }),
    )
    .with_ttl(ttl(ttls.favorites))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client.clone();
    let recommendations = SnapshotCache::new(
      "recommendations",
      lister(move || {
        let c = c.clone();
        async move { c.recommended_jobs().await }
      }),
    )
    .with_ttl(ttl(ttls.recommendations))
    .with_clock(clock.clone());

    let c = client.clone();
    let interviews = CacheStore::new(
      "interviews",
      fetcher(move |req: PageRequest<InterviewFilter>| {
        let c = c.clone();
        async move { c.interviews(req).await }
      }),
    )
    .with_ttl(ttl(ttls.interviews))
    .with_page_size(page_size)
    .with_clock(clock.clone());

    let c = client;
    let conversations = CacheStore::new(
      "conversations",
      fetcher(move |req: PageRequest<ConversationFilter>| {
        let c = c.clone();
        async move { c.conversations(req).await }
      }),
    )
    .with_ttl(ttl(ttls.conversations))
    .with_page_size(page_size)
    .with_clock(clock);

    info!(page_size, business_id = ?config.business_id, "stores ready");

    Self {
      business_jobs: BusinessJobStore::new(business_jobs, popular),
      applications: ApplicationStore::new(applications),
      user_jobs: UserJobStore::new(listings, applied, favorites, recommendations),
      interviews: InterviewStore::new(interviews),
      conversations: ConversationStore::new(conversations),
    }
  }

  /// Forget everything, e.g. on logout.
  pub fn clear(&self) {
    self.business_jobs.clear();
    self.applications.clear();
    self.user_jobs.clear();
    self.interviews.clear();
    self.conversations.clear();
    info!("all caches cleared");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FetchOutcome, ManualClock};
  use chrono::{TimeZone, Utc};

  fn offline_stores() -> (AppStores, Arc<ManualClock>) {
    // Nothing listens on port 9; every request fails fast
    let config = Config::with_base_url("http://127.0.0.1:9/api");
    let client = MarketplaceClient::new(&config).unwrap();
    let clock = Arc::new(ManualClock::new(
      Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    (AppStores::with_clock(&config, client, clock.clone()), clock)
  }

  #[tokio::test]
  async fn test_unreachable_backend_leaves_caches_empty() {
    let (stores, _clock) = offline_stores();

    let outcome = stores
      .user_jobs
      .fetch_jobs_for_filter(&JobFilter::default(), 0)
      .await;

    assert_eq!(outcome, FetchOutcome::Failed);
    assert!(stores.user_jobs.jobs(&JobFilter::default()).is_none());
    assert!(!stores.user_jobs.is_loading_jobs(&JobFilter::default()));
  }

  #[tokio::test]
  async fn test_popular_without_business_fails_softly() {
    let (stores, _clock) = offline_stores();

    assert_eq!(stores.business_jobs.fetch_most_popular().await, FetchOutcome::Failed);
    assert!(stores.business_jobs.most_applied_jobs().is_empty());
  }

  #[tokio::test]
  async fn test_clones_share_state() {
    let (stores, _clock) = offline_stores();
    let other = stores.clone();

    stores.applications.shortlist_candidate(1, 2);
    assert!(other.applications.is_candidate_shortlisted(1, 2));

    other.clear();
    assert!(!stores.applications.is_candidate_shortlisted(1, 2));
  }
}
