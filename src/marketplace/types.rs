use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cache::EntityId;

/// Lifecycle of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
  Draft,
  Open,
  Paused,
  Closed,
}

/// Where a candidate's application stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
  Pending,
  Reviewed,
  Shortlisted,
  Interview,
  Rejected,
  Hired,
  Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
  Scheduled,
  Rescheduled,
  Completed,
  Cancelled,
}

impl JobStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      JobStatus::Draft => "DRAFT",
      JobStatus::Open => "OPEN",
      JobStatus::Paused => "PAUSED",
      JobStatus::Closed => "CLOSED",
    }
  }
}

impl ApplicationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ApplicationStatus::Pending => "PENDING",
      ApplicationStatus::Reviewed => "REVIEWED",
      ApplicationStatus::Shortlisted => "SHORTLISTED",
      ApplicationStatus::Interview => "INTERVIEW",
      ApplicationStatus::Rejected => "REJECTED",
      ApplicationStatus::Hired => "HIRED",
      ApplicationStatus::Withdrawn => "WITHDRAWN",
    }
  }

  /// Still waiting for a recruiter decision
  pub fn is_pending(&self) -> bool {
    matches!(self, ApplicationStatus::Pending)
  }
}

impl InterviewStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      InterviewStatus::Scheduled => "SCHEDULED",
      InterviewStatus::Rescheduled => "RESCHEDULED",
      InterviewStatus::Completed => "COMPLETED",
      InterviewStatus::Cancelled => "CANCELLED",
    }
  }
}

impl fmt::Display for JobStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl fmt::Display for ApplicationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl fmt::Display for InterviewStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl JobStatus {
  pub const ALL: [JobStatus; 4] = [
    JobStatus::Draft,
    JobStatus::Open,
    JobStatus::Paused,
    JobStatus::Closed,
  ];
}

impl ApplicationStatus {
  pub const ALL: [ApplicationStatus; 7] = [
    ApplicationStatus::Pending,
    ApplicationStatus::Reviewed,
    ApplicationStatus::Shortlisted,
    ApplicationStatus::Interview,
    ApplicationStatus::Rejected,
    ApplicationStatus::Hired,
    ApplicationStatus::Withdrawn,
  ];
}

impl InterviewStatus {
  pub const ALL: [InterviewStatus; 4] = [
    InterviewStatus::Scheduled,
    InterviewStatus::Rescheduled,
    InterviewStatus::Completed,
    InterviewStatus::Cancelled,
  ];
}

/// Case-insensitive lookup of a status by its wire name.
fn parse_status<S: Copy>(raw: &str, all: &[S], name: impl Fn(&S) -> &'static str) -> Result<S> {
  all
    .iter()
    .copied()
    .find(|status| name(status).eq_ignore_ascii_case(raw.trim()))
    .ok_or_else(|| {
      let known: Vec<&str> = all.iter().map(&name).collect();
      eyre!("Unknown status '{}', expected one of {}", raw, known.join(", "))
    })
}

impl FromStr for JobStatus {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    parse_status(s, &Self::ALL, Self::as_str)
  }
}

impl FromStr for ApplicationStatus {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    parse_status(s, &Self::ALL, Self::as_str)
  }
}

impl FromStr for InterviewStatus {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    parse_status(s, &Self::ALL, Self::as_str)
  }
}

/// A job as seen by a job seeker in listings, favorites and recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
  pub id: EntityId,
  pub title: String,
  #[serde(default)]
  pub company_name: String,
  pub location: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  pub min_salary: Option<u32>,
  pub max_salary: Option<u32>,
  pub experience: Option<String>,
  #[serde(default)]
  pub application_count: u64,
  #[serde(default)]
  pub view_count: u64,
  pub posted_at: Option<DateTime<Utc>>,
}

/// A job posted by the signed-in business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessJob {
  pub id: EntityId,
  pub title: String,
  pub status: JobStatus,
  pub location: Option<String>,
  #[serde(default)]
  pub application_count: u64,
  #[serde(default)]
  pub pending_application_count: u64,
  #[serde(default)]
  pub interview_count: u64,
  #[serde(default)]
  pub view_count: u64,
  pub created_at: Option<DateTime<Utc>>,
}

/// "Most popular" breakdown for a business
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularJobs {
  #[serde(default)]
  pub most_applied: Vec<BusinessJob>,
  #[serde(default)]
  pub most_viewed: Vec<BusinessJob>,
}

/// A candidate's application to one job, as seen by the recruiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  pub id: EntityId,
  pub job_id: EntityId,
  pub candidate_id: EntityId,
  #[serde(default)]
  pub candidate_name: String,
  pub status: ApplicationStatus,
  pub applied_at: Option<DateTime<Utc>>,
}

/// A job the signed-in seeker applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
  pub application_id: EntityId,
  pub job_id: EntityId,
  pub title: String,
  #[serde(default)]
  pub company_name: String,
  pub status: ApplicationStatus,
  pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
  pub id: EntityId,
  pub job_id: EntityId,
  #[serde(default)]
  pub job_title: String,
  #[serde(default)]
  pub candidate_name: String,
  pub scheduled_at: DateTime<Utc>,
  pub status: InterviewStatus,
  pub meeting_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
  pub id: EntityId,
  #[serde(default)]
  pub participant_name: String,
  pub job_title: Option<String>,
  pub last_message: Option<String>,
  pub last_message_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub unread_count: u32,
}
