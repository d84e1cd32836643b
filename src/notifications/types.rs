//! Notification records and their categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::NotificationId;
use crate::chat::core::types::timestamp_serde;

/// Category of a notification as sent by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A beekeeper profile was verified.
    BeekeeperVerified,
    /// A beekeeper profile was rejected.
    BeekeeperRejected,
    /// A foraging area was reserved.
    AreaReserved,
    /// A reservation was confirmed.
    ReservationConfirmed,
    /// A reservation was cancelled.
    ReservationCancelled,
    /// A chat message arrived.
    NewMessage,
    /// A buyer placed an order.
    NewOrder,
    /// An order was shipped.
    OrderShipped,
    /// A product received a review.
    ProductReview,
    /// Platform announcement.
    System,
    /// Any category this client does not know yet.
    #[serde(other)]
    Other,
}

impl NotificationKind {
    /// Short plain-text tag for list rendering.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BeekeeperVerified => "verified",
            Self::BeekeeperRejected => "rejected",
            Self::AreaReserved => "area",
            Self::ReservationConfirmed => "reservation",
            Self::ReservationCancelled => "cancelled",
            Self::NewMessage => "message",
            Self::NewOrder => "order",
            Self::OrderShipped => "shipped",
            Self::ProductReview => "review",
            Self::System => "system",
            Self::Other => "info",
        }
    }
}

/// A single notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Whether the user has seen it.
    #[serde(default)]
    pub is_read: bool,
    /// Creation time.
    #[serde(with = "timestamp_serde")]
    pub created_at: DateTime<Utc>,
    /// Page to navigate to when opened.
    #[serde(default)]
    pub action_url: Option<String>,
}

/// Body of `GET /notifications/unread/count`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications.
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_from_backend_json() {
        let json = r#"{
            "id": 8,
            "type": "NEW_ORDER",
            "title": "New order",
            "message": "2 jars of linden honey",
            "isRead": false,
            "createdAt": "2025-04-30T18:00:00",
            "actionUrl": "orders.html"
        }"#;
        let notification: Notification = serde_json::from_str(json).unwrap_or_else(|err| {
            unreachable!("payload should parse: {err}");
        });
        assert_eq!(notification.kind, NotificationKind::NewOrder);
        assert_eq!(notification.action_url.as_deref(), Some("orders.html"));
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        let json = r#"{"id": 1, "type": "SOMETHING_NEW", "title": "t", "createdAt": "2025-04-30T18:00:00Z"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap_or_else(|err| {
            unreachable!("payload should parse: {err}");
        });
        assert_eq!(notification.kind, NotificationKind::Other);
        assert_eq!(notification.kind.label(), "info");
    }
}
