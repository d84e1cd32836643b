//! Notification list and unread badge, kept fresh by a background poller.
//!
//! Every failure here is logged only; the bell never shows an error state.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::NotificationId;
use crate::chat::view::format::badge_label;
use crate::notifications::api::NotificationsApi;
use crate::notifications::types::Notification;
use crate::polling::{PollConfigBuilder, PollToken, Poller};

/// Rendering surface for the notification bell.
pub trait NotificationView: Send + Sync {
    /// Replace the dropdown list.
    fn render_notifications(&self, notifications: &[Notification]);

    /// Update the badge; `None` hides it.
    fn render_badge(&self, badge: Option<&str>);
}

#[derive(Default)]
struct CenterState {
    notifications: Vec<Notification>,
    unread: u32,
}

struct CenterInner {
    api: Arc<dyn NotificationsApi>,
    view: Arc<dyn NotificationView>,
    badge_cap: u32,
    state: Mutex<CenterState>,
}

/// Client-side notification state.
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
    poller: Poller,
}

impl NotificationCenter {
    /// Create an empty center; nothing is fetched until asked.
    #[must_use]
    pub fn new(
        api: Arc<dyn NotificationsApi>,
        view: Arc<dyn NotificationView>,
        config: &ChatConfig,
    ) -> Self {
        let poll = PollConfigBuilder::new()
            .interval(config.notification_poll_interval)
            .fire_immediately(true)
            .build();
        Self {
            inner: Arc::new(CenterInner {
                api,
                view,
                badge_cap: config.directory.badge_cap,
                state: Mutex::new(CenterState::default()),
            }),
            poller: Poller::new("notifications", poll),
        }
    }

    /// Fetch and render the full list.
    ///
    /// # Errors
    /// Returns the API error after logging it.
    pub async fn load(&self) -> ChatResult<()> {
        let notifications = self.inner.api.list_notifications().await.inspect_err(|err| {
            warn!(error = %err, "Failed to load notifications");
        })?;
        let mut state = self.inner.state.lock().await;
        state.notifications = notifications;
        self.inner.view.render_notifications(&state.notifications);
        Ok(())
    }

    /// Fetch the unread count and update the badge.
    ///
    /// # Errors
    /// Returns the API error after logging it.
    pub async fn refresh_unread_count(&self) -> ChatResult<u32> {
        self.inner.refresh_unread_count().await
    }

    /// Poll the unread count, first call immediately.
    pub fn start_polling(&self) {
        let weak: Weak<CenterInner> = Arc::downgrade(&self.inner);
        self.poller.start(move |token: PollToken| {
            let weak = Weak::clone(&weak);
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if token.is_live() {
                    let _ = inner.refresh_unread_count().await;
                }
            }
        });
    }

    /// Stop polling the unread count.
    pub fn stop_polling(&self) {
        self.poller.stop();
    }

    /// Mark one notification read.
    ///
    /// # Errors
    /// Returns the API error; local state is left untouched in that case.
    pub async fn mark_read(&self, id: NotificationId) -> ChatResult<()> {
        self.inner
            .api
            .mark_notification_read(id)
            .await
            .inspect_err(|err| warn!(notification = %id, error = %err, "Failed to mark notification read"))?;

        let mut state = self.inner.state.lock().await;
        let was_unread = match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => !std::mem::replace(&mut notification.is_read, true),
            None => false,
        };
        if was_unread {
            state.unread = state.unread.saturating_sub(1);
        }
        self.inner.render(&state);
        Ok(())
    }

    /// Mark every notification read.
    ///
    /// # Errors
    /// Returns the API error; local state is left untouched in that case.
    pub async fn mark_all_read(&self) -> ChatResult<()> {
        self.inner
            .api
            .mark_all_notifications_read()
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to mark all notifications read"))?;

        let mut state = self.inner.state.lock().await;
        for notification in &mut state.notifications {
            notification.is_read = true;
        }
        state.unread = 0;
        self.inner.render(&state);
        Ok(())
    }

    /// Delete a notification.
    ///
    /// # Errors
    /// Returns the API error; local state is left untouched in that case.
    pub async fn delete(&self, id: NotificationId) -> ChatResult<()> {
        self.inner
            .api
            .delete_notification(id)
            .await
            .inspect_err(|err| warn!(notification = %id, error = %err, "Failed to delete notification"))?;

        let mut state = self.inner.state.lock().await;
        let position = state.notifications.iter().position(|n| n.id == id);
        if let Some(removed) = position.map(|index| state.notifications.remove(index)) {
            if !removed.is_read {
                state.unread = state.unread.saturating_sub(1);
            }
        }
        self.inner.render(&state);
        Ok(())
    }

    /// Last known unread count.
    pub async fn unread_count(&self) -> u32 {
        self.inner.state.lock().await.unread
    }

    /// Badge text for the last known unread count.
    pub async fn badge(&self) -> Option<String> {
        badge_label(self.unread_count().await, self.inner.badge_cap)
    }

    /// Snapshot of the loaded list.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.state.lock().await.notifications.clone()
    }
}

impl CenterInner {
    async fn refresh_unread_count(&self) -> ChatResult<u32> {
        let count = self
            .api
            .unread_notification_count()
            .await
            .inspect_err(|err| debug!(error = %err, "Failed to fetch unread notification count"))?;
        let mut state = self.state.lock().await;
        state.unread = count;
        self.view
            .render_badge(badge_label(count, self.badge_cap).as_deref());
        Ok(count)
    }

    fn render(&self, state: &CenterState) {
        self.view.render_notifications(&state.notifications);
        self.view
            .render_badge(badge_label(state.unread, self.badge_cap).as_deref());
    }
}
