use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::cache::{EntityId, Page, PageRequest};
use crate::config::Config;

use super::filters::ToQuery;
use super::types::{
  AppliedJob, Application, BusinessJob, Conversation, Interview, JobListing, PopularJobs,
};

/// Marketplace REST API client
#[derive(Clone)]
pub struct MarketplaceClient {
  http: reqwest::Client,
  base_url: Url,
}

impl MarketplaceClient {
  pub fn new(config: &Config) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    // Anonymous browsing is allowed; only attach a token when one is set
    if let Ok(token) = Config::get_api_token() {
      let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| eyre!("Invalid API token: {}", e))?;
      headers.insert(AUTHORIZATION, value);
    }

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .gzip(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: parse_base_url(&config.api.base_url)?,
    })
  }

  /// Jobs posted by a business
  pub async fn business_jobs<Q: ToQuery>(&self, request: PageRequest<Q>) -> Result<Page<BusinessJob>> {
    let business_id = require_scope(&request, "business")?;
    self
      .get_page(&format!("business/{}/jobs", business_id), &request)
      .await
  }

  /// Most applied and most viewed jobs of a business
  pub async fn popular_jobs(&self, business_id: EntityId) -> Result<PopularJobs> {
    self
      .get_json(&format!("business/{}/jobs/popular", business_id), &[])
      .await
  }

  /// Applications received for a job
  pub async fn job_applications<Q: ToQuery>(
    &self,
    request: PageRequest<Q>,
  ) -> Result<Page<Application>> {
    let job_id = require_scope(&request, "job")?;
    self
      .get_page(&format!("jobs/{}/applications", job_id), &request)
      .await
  }

  /// Public job search
  pub async fn search_jobs<Q: ToQuery>(&self, request: PageRequest<Q>) -> Result<Page<JobListing>> {
    self.get_page("jobs/search", &request).await
  }

  /// Jobs the signed-in seeker applied to
  pub async fn applied_jobs<Q: ToQuery>(&self, request: PageRequest<Q>) -> Result<Page<AppliedJob>> {
    self.get_page("users/me/applications", &request).await
  }

  pub async fn favorite_jobs<Q: ToQuery>(&self, request: PageRequest<Q>) -> Result<Page<JobListing>> {
    self.get_page("users/me/favorites", &request).await
  }

  pub async fn recommended_jobs(&self) -> Result<Vec<JobListing>> {
    self.get_json("users/me/recommendations", &[]).await
  }

  pub async fn interviews<Q: ToQuery>(&self, request: PageRequest<Q>) -> Result<Page<Interview>> {
    self.get_page("interviews", &request).await
  }

  pub async fn conversations<Q: ToQuery>(
    &self,
    request: PageRequest<Q>,
  ) -> Result<Page<Conversation>> {
    self.get_page("conversations", &request).await
  }

  async fn get_page<T, Q>(&self, path: &str, request: &PageRequest<Q>) -> Result<Page<T>>
  where
    T: DeserializeOwned,
    Q: ToQuery,
  {
    self.get_json(path, &page_query(request)).await
  }

  async fn get_json<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R> {
    let url = self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))?;

    let response = self
      .http
      .get(url.clone())
      .query(query)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?;

    serde_json::from_slice(&body).map_err(|e| eyre!("Failed to parse response from {}: {}", url, e))
  }
}

/// Ensure the base URL ends with `/` so relative endpoints join under it.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut base = Url::parse(raw).map_err(|e| eyre!("Invalid API base URL {}: {}", raw, e))?;
  if !base.path().ends_with('/') {
    let path = format!("{}/", base.path());
    base.set_path(&path);
  }
  Ok(base)
}

fn require_scope<Q>(request: &PageRequest<Q>, what: &str) -> Result<EntityId> {
  request
    .scope
    .ok_or_else(|| eyre!("A {} id is required for this request", what))
}

fn page_query<Q: ToQuery>(request: &PageRequest<Q>) -> Vec<(&'static str, String)> {
  let mut query = vec![
    ("page", request.page.to_string()),
    ("size", request.page_size.to_string()),
  ];
  query.extend(request.filter.query_pairs());
  query
}
