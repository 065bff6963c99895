//! Caching implementations for marketplace types.

use crate::cache::{Cacheable, EntityId};

use super::types::{AppliedJob, Application, BusinessJob, Conversation, Interview, JobListing};

impl Cacheable for JobListing {
  fn entity_id(&self) -> EntityId {
    self.id
  }

  fn entity_type() -> &'static str {
    "job_listing"
  }
}

impl Cacheable for BusinessJob {
  fn entity_id(&self) -> EntityId {
    self.id
  }

  fn entity_type() -> &'static str {
    "business_job"
  }
}

impl Cacheable for Application {
  fn entity_id(&self) -> EntityId {
    self.id
  }

  fn entity_type() -> &'static str {
    "application"
  }
}

impl Cacheable for AppliedJob {
  fn entity_id(&self) -> EntityId {
    // One application per job, so the job is the identity in the seeker's list
    self.job_id
  }

  fn entity_type() -> &'static str {
    "applied_job"
  }
}

impl Cacheable for Interview {
  fn entity_id(&self) -> EntityId {
    self.id
  }

  fn entity_type() -> &'static str {
    "interview"
  }
}

impl Cacheable for Conversation {
  fn entity_id(&self) -> EntityId {
    self.id
  }

  fn entity_type() -> &'static str {
    "conversation"
  }
}
