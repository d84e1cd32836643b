//! Conversation list state shared by the list pane and the open session.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::chat::api::MessagingApi;
use crate::chat::core::config::DirectoryConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::{ConversationId, UserId};
use crate::chat::core::types::{Conversation, StartConversationRequest, StartedConversation};
use crate::chat::view::ConversationListView;
use crate::chat::view::format::badge_label;

#[derive(Default)]
struct DirectoryState {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    filter: String,
    loaded: bool,
}

impl DirectoryState {
    fn visible(&self) -> Vec<Conversation> {
        let query = self.filter.trim().to_lowercase();
        if query.is_empty() {
            return self.conversations.clone();
        }
        self.conversations
            .iter()
            .filter(|conversation| {
                conversation.other_party().to_lowercase().contains(&query)
                    || conversation
                        .last_message_preview()
                        .is_some_and(|preview| preview.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }
}

/// The user's conversations, refreshed on demand.
pub struct ConversationDirectory {
    api: Arc<dyn MessagingApi>,
    view: Arc<dyn ConversationListView>,
    config: DirectoryConfig,
    state: Mutex<DirectoryState>,
}

impl ConversationDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new(
        api: Arc<dyn MessagingApi>,
        view: Arc<dyn ConversationListView>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            api,
            view,
            config,
            state: Mutex::new(DirectoryState::default()),
        }
    }

    /// Fetch the list and re-render it when it changed.
    ///
    /// Until the first successful load the view shows a loading state and,
    /// on failure, an error state. Later failures leave the list untouched.
    ///
    /// # Errors
    /// Returns the API error; callers running in the background only log it.
    pub async fn refresh(&self) -> ChatResult<()> {
        let first_load = !self.state.lock().await.loaded;
        if first_load {
            self.view.show_conversations_loading();
        }

        let fetched = match self.api.list_conversations().await {
            Ok(conversations) => conversations,
            Err(err) => {
                if first_load {
                    self.view
                        .show_conversations_error(&err.user_message("Failed to load conversations"));
                }
                warn!(error = %err, "Failed to refresh conversations");
                return Err(err);
            }
        };

        let mut state = self.state.lock().await;
        if state.loaded && state.conversations == fetched {
            debug!("Conversation list unchanged");
            return Ok(());
        }
        debug!(count = fetched.len(), "Conversation list updated");
        state.conversations = fetched;
        state.loaded = true;
        self.view.render_conversations(&state.visible(), state.active);
        Ok(())
    }

    /// Highlight `id` and zero its unread count locally.
    pub async fn mark_opened(&self, id: ConversationId) {
        let mut state = self.state.lock().await;
        state.active = Some(id);
        if let Some(conversation) = state.conversations.iter_mut().find(|c| c.id == id) {
            conversation.unread_count = 0;
        }
        if state.loaded {
            self.view.render_conversations(&state.visible(), state.active);
        }
    }

    /// Drop the highlight.
    pub async fn clear_active(&self) {
        let mut state = self.state.lock().await;
        state.active = None;
        if state.loaded {
            self.view.render_conversations(&state.visible(), None);
        }
    }

    /// Restrict rendering to conversations matching `query`.
    pub async fn set_filter(&self, query: &str) {
        let mut state = self.state.lock().await;
        state.filter = query.to_string();
        if state.loaded {
            self.view.render_conversations(&state.visible(), state.active);
        }
    }

    /// Sum of unread counts over every conversation.
    pub async fn total_unread(&self) -> u32 {
        self.state
            .lock()
            .await
            .conversations
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    /// Badge for the global unread counter.
    pub async fn unread_badge(&self) -> Option<String> {
        badge_label(self.total_unread().await, self.config.badge_cap)
    }

    /// Cached conversation by id.
    pub async fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.state
            .lock()
            .await
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Snapshot of the cached list, unfiltered.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().await.conversations.clone()
    }

    /// Start a conversation with `other_user`, or find the existing one.
    ///
    /// # Errors
    /// Returns [`ChatError::EmptyMessage`] for a blank opener, otherwise the
    /// API error.
    pub async fn start_conversation(
        &self,
        other_user: UserId,
        initial_message: &str,
    ) -> ChatResult<ConversationId> {
        let initial_message = initial_message.trim();
        if initial_message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let started = self
            .api
            .start_conversation(StartConversationRequest {
                other_user_id: other_user,
                initial_message: initial_message.to_string(),
            })
            .await?;

        match &started {
            StartedConversation::Created(conversation) => {
                info!(conversation = %conversation.id, user = %other_user, "Conversation started");
            }
            StartedConversation::Existing(id) => {
                info!(conversation = %id, user = %other_user, "Conversation already exists");
            }
        }

        if let Err(err) = self.refresh().await {
            debug!(error = %err, "Directory refresh after start failed");
        }
        Ok(started.id())
    }
}
