//! Notification bell: list, unread badge and read/delete actions.

pub mod api;
pub mod center;
pub mod types;

pub use api::NotificationsApi;
pub use center::{NotificationCenter, NotificationView};
pub use types::{Notification, NotificationKind};
