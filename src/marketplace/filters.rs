//! Query filters for each marketplace collection.
//!
//! Each filter knows how to encode itself into a cache key and how to render
//! itself as HTTP query parameters.

use crate::cache::{EntityId, FilterKey, KeyBuilder, NoFilter};

use super::types::{ApplicationStatus, InterviewStatus, JobStatus};

/// Render a filter as query string pairs. List values repeat the parameter.
pub trait ToQuery {
  fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

impl ToQuery for NoFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    Vec::new()
  }
}

fn push_list<S: ToString>(pairs: &mut Vec<(&'static str, String)>, name: &'static str, values: &[S]) {
  pairs.extend(values.iter().map(|v| (name, v.to_string())));
}

fn push_opt<S: ToString>(pairs: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&S>) {
  if let Some(v) = value {
    pairs.push((name, v.to_string()));
  }
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, name: &'static str, value: &str) {
  let value = value.trim();
  if !value.is_empty() {
    pairs.push((name, value.to_string()));
  }
}

fn as_strs<S: ToString>(values: &[S]) -> Vec<String> {
  values.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Job seeker listings
// ============================================================================

/// Job search criteria selected by a seeker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
  pub search: String,
  pub locations: Vec<String>,
  pub tags: Vec<String>,
  pub companies: Vec<String>,
  /// Radius in km
  pub distance: Option<u32>,
  pub min_salary: Option<u32>,
  pub max_salary: Option<u32>,
  pub experience: Option<String>,
}

impl FilterKey for JobFilter {
  fn encode(&self) -> String {
    KeyBuilder::new()
      .text(&self.search)
      .list(&self.locations)
      .list(&self.tags)
      .list(&self.companies)
      .opt(self.distance)
      .opt(self.min_salary)
      .opt(self.max_salary)
      .opt(self.experience.as_deref())
      .finish()
  }
}

impl ToQuery for JobFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "search", &self.search);
    push_list(&mut pairs, "location", &self.locations);
    push_list(&mut pairs, "tag", &self.tags);
    push_list(&mut pairs, "company", &self.companies);
    push_opt(&mut pairs, "distance", self.distance.as_ref());
    push_opt(&mut pairs, "minSalary", self.min_salary.as_ref());
    push_opt(&mut pairs, "maxSalary", self.max_salary.as_ref());
    push_opt(&mut pairs, "experience", self.experience.as_ref());
    pairs
  }
}

// ============================================================================
// Business job management
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessJobFilter {
  pub search: String,
  pub statuses: Vec<JobStatus>,
  pub sort: Option<String>,
}

impl FilterKey for BusinessJobFilter {
  fn encode(&self) -> String {
    KeyBuilder::new()
      .text(&self.search)
      .list(&as_strs(&self.statuses))
      .opt_or(self.sort.as_deref(), "newest")
      .finish()
  }
}

impl ToQuery for BusinessJobFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "search", &self.search);
    push_list(&mut pairs, "status", &self.statuses);
    push_opt(&mut pairs, "sort", self.sort.as_ref());
    pairs
  }
}

// ============================================================================
// Applications for a job (recruiter side)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
  pub search: String,
  pub statuses: Vec<ApplicationStatus>,
  /// Minimum years of experience
  pub min_experience: Option<u32>,
}

impl FilterKey for ApplicationFilter {
  fn encode(&self) -> String {
    KeyBuilder::new()
      .text(&self.search)
      .list(&as_strs(&self.statuses))
      .opt_or(self.min_experience, "any")
      .finish()
  }
}

impl ToQuery for ApplicationFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "search", &self.search);
    push_list(&mut pairs, "status", &self.statuses);
    push_opt(&mut pairs, "minExperience", self.min_experience.as_ref());
    pairs
  }
}

// ============================================================================
// Seeker's own applications
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedJobFilter {
  pub statuses: Vec<ApplicationStatus>,
}

impl FilterKey for AppliedJobFilter {
  fn encode(&self) -> String {
    KeyBuilder::new().list(&as_strs(&self.statuses)).finish()
  }
}

impl ToQuery for AppliedJobFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_list(&mut pairs, "status", &self.statuses);
    pairs
  }
}

// ============================================================================
// Interviews
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewFilter {
  pub statuses: Vec<InterviewStatus>,
  pub job_id: Option<EntityId>,
  pub upcoming_only: bool,
}

impl FilterKey for InterviewFilter {
  fn encode(&self) -> String {
    KeyBuilder::new()
      .list(&as_strs(&self.statuses))
      .opt_or(self.job_id, "any")
      .flag(self.upcoming_only)
      .finish()
  }
}

impl ToQuery for InterviewFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_list(&mut pairs, "status", &self.statuses);
    push_opt(&mut pairs, "jobId", self.job_id.as_ref());
    if self.upcoming_only {
      pairs.push(("upcoming", "true".to_string()));
    }
    pairs
  }
}

// ============================================================================
// Conversations
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationFilter {
  pub search: String,
  pub unread_only: bool,
}

impl FilterKey for ConversationFilter {
  fn encode(&self) -> String {
    KeyBuilder::new()
      .text(&self.search)
      .flag(self.unread_only)
      .finish()
  }
}

impl ToQuery for ConversationFilter {
  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "search", &self.search);
    if self.unread_only {
      pairs.push(("unread", "true".to_string()));
    }
    pairs
  }
}
