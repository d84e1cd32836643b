//! Rendering surfaces driven by the session, directory, and notification center.
//!
//! Views receive already-decided render calls; they never fetch or cache
//! anything themselves. All methods are synchronous and must not block.

pub mod format;
pub mod terminal;

pub use format::{DayGroup, group_by_day};
pub use terminal::TerminalView;

use crate::chat::core::ids::ConversationId;
use crate::chat::core::types::{Conversation, Message};

/// Severity of a transient notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    /// Neutral information.
    Info,
    /// Completed action.
    Success,
    /// Failed action.
    Error,
}

/// Message pane of an open conversation.
pub trait MessageView: Send + Sync {
    /// Replace the pane with a loading indicator.
    fn show_loading(&self);

    /// Replace the pane with an error state.
    fn show_error(&self, message: &str);

    /// Replace the pane with messages grouped by calendar day.
    fn render_messages(&self, days: &[DayGroup<'_>]);

    /// Append one message bubble after the current content.
    fn append_message(&self, message: &Message);

    /// Pixels between the visible bottom edge and the end of the content.
    fn distance_from_bottom(&self) -> f64;

    /// Scroll the pane to its end.
    fn scroll_to_bottom(&self);

    /// Enable or disable the compose input and send button.
    fn set_input_enabled(&self, enabled: bool);

    /// Clear the compose input.
    fn clear_input(&self);

    /// Show a short-lived notice.
    fn show_toast(&self, message: &str, level: ToastLevel);
}

/// Conversation list pane.
pub trait ConversationListView: Send + Sync {
    /// Replace the list with a loading indicator.
    fn show_conversations_loading(&self);

    /// Replace the list with an error state.
    fn show_conversations_error(&self, message: &str);

    /// Render the (filtered) conversation list, highlighting `active`.
    fn render_conversations(&self, conversations: &[Conversation], active: Option<ConversationId>);
}
