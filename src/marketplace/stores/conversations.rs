use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::cache::{CacheStore, EntityId, FetchOutcome, Pagination};
use crate::marketplace::filters::ConversationFilter;
use crate::marketplace::types::Conversation;

/// Message threads and their unread counts.
#[derive(Clone)]
pub struct ConversationStore {
  conversations: CacheStore<ConversationFilter, Conversation>,
}

impl ConversationStore {
  pub fn new(conversations: CacheStore<ConversationFilter, Conversation>) -> Self {
    Self { conversations }
  }

  pub async fn fetch_conversations(&self, filter: &ConversationFilter, page: u32) -> FetchOutcome {
    self.conversations.fetch(None, filter, page).await
  }

  pub async fn fetch_next_conversations_page(&self, filter: &ConversationFilter) -> FetchOutcome {
    self.conversations.fetch_next_page(None, filter).await
  }

  pub async fn refresh_conversations(&self, filter: &ConversationFilter) -> FetchOutcome {
    self.conversations.refresh(None, filter).await
  }

  pub fn conversations(&self, filter: &ConversationFilter) -> Option<Vec<Conversation>> {
    self.conversations.get(None, filter)
  }

  pub fn is_loading_conversations(&self, filter: &ConversationFilter) -> bool {
    self.conversations.is_loading(None, filter)
  }

  pub fn has_valid_conversations_cache(&self, filter: &ConversationFilter) -> bool {
    self.conversations.has_valid_cache(None, filter)
  }

  pub fn total_conversations(&self, filter: &ConversationFilter) -> u64 {
    self.conversations.total_count(None, filter)
  }

  pub fn conversations_pagination(&self, filter: &ConversationFilter) -> Pagination {
    self.conversations.pagination(None, filter)
  }

  pub fn mark_read(&self, conversation_id: EntityId) -> usize {
    self.conversations.patch_items(None, |c| {
      if c.id == conversation_id && c.unread_count > 0 {
        c.unread_count = 0;
        true
      } else {
        false
      }
    })
  }

  /// A new message arrived outside of a fetch.
  pub fn record_incoming_message(
    &self,
    conversation_id: EntityId,
    preview: &str,
    at: DateTime<Utc>,
  ) -> usize {
    self.conversations.patch_entity(None, conversation_id, |c| {
      c.last_message = Some(preview.to_string());
      c.last_message_at = Some(at);
      c.unread_count = c.unread_count.saturating_add(1);
    })
  }

  /// Unread messages across every cached conversation, each counted once.
  pub fn total_unread(&self) -> u64 {
    self
      .conversations
      .all_items()
      .iter()
      .map(|c| u64::from(c.unread_count))
      .sum()
  }

  pub fn clear(&self) {
    self.conversations.clear();
  }

  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.conversations.subscribe()
  }
}
