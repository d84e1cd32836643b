//! Notification endpoints of the backend.

use crate::chat::api::ApiFuture;
use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::NotificationId;
use crate::notifications::types::Notification;

/// Trait abstraction over the notification REST endpoints.
pub trait NotificationsApi: Send + Sync {
    /// List the current user's notifications.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn list_notifications(&self) -> ApiFuture<'_, ChatResult<Vec<Notification>>>;

    /// Number of unread notifications.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn unread_notification_count(&self) -> ApiFuture<'_, ChatResult<u32>>;

    /// Mark one notification as read.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn mark_notification_read(&self, id: NotificationId) -> ApiFuture<'_, ChatResult<()>>;

    /// Mark every notification as read.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn mark_all_notifications_read(&self) -> ApiFuture<'_, ChatResult<()>>;

    /// Delete a notification.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn delete_notification(&self, id: NotificationId) -> ApiFuture<'_, ChatResult<()>>;
}
