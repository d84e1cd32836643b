//! The open conversation: message cache, polling, read marking and sending.
//!
//! Nothing here cancels a request. Every await that returns messages is
//! followed by a check that the conversation it fetched for is still the
//! active one; stale results are dropped. A send and a poll may still race:
//! whichever resolves last decides what the pane shows.

use std::future::Future;
use std::sync::{Arc, Weak};

use chrono::Local;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::api::MessagingApi;
use crate::chat::core::config::SessionConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::ConversationId;
use crate::chat::core::types::{Message, SendMessageRequest};
use crate::chat::directory::ConversationDirectory;
use crate::chat::session::reconcile::{ReconcileAction, plan_reconcile};
use crate::chat::view::{MessageView, ToastLevel, group_by_day};
use crate::polling::{PollConfigBuilder, PollToken, Poller};

#[derive(Default)]
struct SessionState {
    active: Option<ConversationId>,
    messages: Vec<Message>,
    sending: bool,
}

struct SessionInner {
    api: Arc<dyn MessagingApi>,
    view: Arc<dyn MessageView>,
    directory: Arc<ConversationDirectory>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    poller: Poller,
    background: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Client-side state of the message pane.
///
/// Dropping the session stops its polling cycle and any pending background
/// work.
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

impl ConversationSession {
    /// Create a session with nothing open.
    #[must_use]
    pub fn new(
        api: Arc<dyn MessagingApi>,
        view: Arc<dyn MessageView>,
        directory: Arc<ConversationDirectory>,
        config: SessionConfig,
    ) -> Self {
        let poller = Poller::new(
            "messages",
            PollConfigBuilder::new().interval(config.poll_interval).build(),
        );
        Self {
            inner: Arc::new(SessionInner {
                api,
                view,
                directory,
                config,
                state: Mutex::new(SessionState::default()),
                poller,
                background: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// Directory this session keeps in sync.
    #[must_use]
    pub fn directory(&self) -> &Arc<ConversationDirectory> {
        &self.inner.directory
    }

    /// Currently open conversation.
    pub async fn active(&self) -> Option<ConversationId> {
        self.inner.state.lock().await.active
    }

    /// Snapshot of the cached messages.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().await.messages.clone()
    }

    /// Open `id`, replacing whatever was open.
    ///
    /// Shows a loading state, fetches and renders the full list, marks the
    /// conversation read in the background followed by a settle fetch, and
    /// starts polling.
    pub async fn open(&self, id: ConversationId) {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock().await;
            state.active = Some(id);
            state.messages.clear();
            inner.poller.stop();
        }
        info!(conversation = %id, "Opening conversation");

        inner.directory.mark_opened(id).await;
        inner.view.show_loading();
        inner.fetch_and_reconcile(id, true).await;

        // Start follow-up work only if nothing else was opened meanwhile.
        let state = inner.state.lock().await;
        if state.active != Some(id) {
            debug!(conversation = %id, "Conversation replaced while loading");
            return;
        }

        let settle = Arc::clone(inner);
        inner.spawn_tracked(async move {
            match settle.api.mark_read(id).await {
                Ok(()) => debug!(conversation = %id, "Conversation marked read"),
                Err(err) => warn!(conversation = %id, error = %err, "Failed to mark conversation read"),
            }
            tokio::time::sleep(settle.config.read_settle_delay).await;
            if settle.is_active(id).await {
                settle.fetch_and_reconcile(id, false).await;
            }
        });

        inner.start_polling(id);
        drop(state);
    }

    /// Re-fetch the open conversation and re-render it even if nothing changed.
    pub async fn reload(&self) {
        let active = self.active().await;
        if let Some(id) = active {
            self.inner.fetch_and_reconcile(id, true).await;
        }
    }

    /// Send `content` to the open conversation.
    ///
    /// On success the server's record is appended to the pane without a
    /// re-fetch and the directory refreshes in the background. On failure a
    /// toast shows the server's reason.
    ///
    /// # Errors
    /// Returns [`ChatError::EmptyMessage`], [`ChatError::NoActiveConversation`]
    /// or [`ChatError::SendInProgress`] without touching the view, or the API
    /// error after showing it.
    pub async fn send(&self, content: &str) -> ChatResult<Message> {
        let inner = &self.inner;
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let id = {
            let mut state = inner.state.lock().await;
            let Some(id) = state.active else {
                return Err(ChatError::NoActiveConversation);
            };
            if state.sending {
                return Err(ChatError::SendInProgress);
            }
            state.sending = true;
            id
        };

        inner.view.set_input_enabled(false);
        let result = inner
            .api
            .send_message(SendMessageRequest {
                conversation_id: id,
                content: content.to_string(),
            })
            .await;

        let outcome = match result {
            Ok(message) => {
                let appended = {
                    let mut state = inner.state.lock().await;
                    state.sending = false;
                    let still_open = state.active == Some(id);
                    if still_open {
                        state.messages.push(message.clone());
                    }
                    still_open
                };
                if appended {
                    inner.view.append_message(&message);
                    inner.view.clear_input();
                    inner.view.scroll_to_bottom();
                }
                info!(conversation = %id, message = %message.id, "Message sent");

                let directory = Arc::clone(&inner.directory);
                inner.spawn_tracked(async move {
                    if let Err(err) = directory.refresh().await {
                        debug!(error = %err, "Directory refresh after send failed");
                    }
                });
                Ok(message)
            }
            Err(err) => {
                inner.state.lock().await.sending = false;
                warn!(conversation = %id, error = %err, "Failed to send message");
                inner
                    .view
                    .show_toast(&err.user_message("Failed to send message"), ToastLevel::Error);
                Err(err)
            }
        };

        inner.view.set_input_enabled(true);
        outcome
    }

    /// Stop polling; the conversation stays open.
    pub fn stop_polling(&self) {
        self.inner.poller.stop();
    }

    /// Whether a polling cycle is scheduled.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_running()
    }

    /// Tear down: stop polling and forget the open conversation.
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.lock().await;
            self.inner.poller.stop();
            if let Some(id) = state.active.take() {
                info!(conversation = %id, "Closing conversation");
            }
            state.messages.clear();
        }
        self.inner.directory.clear_active().await;
    }

    /// Wait for fire-and-forget work spawned so far (read marking, settle
    /// fetches, directory refreshes).
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self
                .inner
                .background
                .lock()
                .map(|mut tasks| tasks.drain(..).collect())
                .unwrap_or_default();
            if pending.is_empty() {
                return;
            }
            for joined in join_all(pending).await {
                if let Err(err) = joined {
                    debug!(error = %err, "Background task ended abnormally");
                }
            }
        }
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.inner.poller.stop();
        if let Ok(mut tasks) = self.inner.background.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl SessionInner {
    async fn is_active(&self, id: ConversationId) -> bool {
        self.state.lock().await.active == Some(id)
    }

    fn spawn_tracked<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(work);
        if let Ok(mut tasks) = self.background.lock() {
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle);
        }
    }

    /// Fetch `id` and bring cache and pane in line with the result.
    async fn fetch_and_reconcile(&self, id: ConversationId, force: bool) {
        let result = self.api.list_messages(id).await;

        let mut state = self.state.lock().await;
        if state.active != Some(id) {
            debug!(conversation = %id, "Discarding messages of a conversation no longer open");
            return;
        }

        let fetched = match result {
            Ok(messages) => messages,
            Err(err) => {
                drop(state);
                if force {
                    self.view.show_error(&err.user_message("Failed to load messages"));
                    warn!(conversation = %id, error = %err, "Failed to load messages");
                } else {
                    debug!(conversation = %id, error = %err, "Background message fetch failed");
                }
                return;
            }
        };

        let threshold = self.config.near_bottom_threshold_px;
        let action = plan_reconcile(state.messages.len(), fetched.len(), force, || {
            self.view.distance_from_bottom() < threshold
        });
        let ReconcileAction::Render { scroll } = action else {
            return;
        };

        debug!(
            conversation = %id,
            previous = state.messages.len(),
            current = fetched.len(),
            scroll,
            "Rendering messages"
        );
        state.messages = fetched;
        {
            let now = Local::now();
            let days = group_by_day(&state.messages, &now);
            self.view.render_messages(&days);
        }
        drop(state);

        if scroll {
            // let the render land before measuring the new end
            tokio::task::yield_now().await;
            self.view.scroll_to_bottom();
        }
    }

    fn start_polling(self: &Arc<Self>, id: ConversationId) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.poller.start(move |token: PollToken| {
            let weak = Weak::clone(&weak);
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !token.is_live() {
                    return;
                }
                inner.fetch_and_reconcile(id, false).await;

                if !token.is_live() {
                    return;
                }
                let directory = Arc::clone(&inner.directory);
                inner.spawn_tracked(async move {
                    if let Err(err) = directory.refresh().await {
                        debug!(error = %err, "Directory refresh during polling failed");
                    }
                });
            }
        });
    }
}
