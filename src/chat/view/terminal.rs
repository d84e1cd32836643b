//! Plain-text renderer for a terminal front end.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, Utc};

use crate::chat::core::config::DirectoryConfig;
use crate::chat::core::ids::ConversationId;
use crate::chat::core::types::{Conversation, Message, ReadReceipt};
use crate::chat::view::format::{
    DayGroup, badge_label, conversation_time_label, message_time_label, relative_time_label,
    truncate_preview,
};
use crate::chat::view::{ConversationListView, MessageView, ToastLevel};
use crate::notifications::{Notification, NotificationView};

/// Line-oriented view writing to any sink (stdout in the binary).
///
/// A terminal always shows its newest output, so the pane is reported as
/// scrolled to the bottom.
pub struct TerminalView<W> {
    out: Mutex<W>,
    input_enabled: AtomicBool,
    directory: DirectoryConfig,
}

impl<W: Write + Send> TerminalView<W> {
    /// Create a view writing to `out`.
    #[must_use]
    pub fn new(out: W, directory: DirectoryConfig) -> Self {
        Self {
            out: Mutex::new(out),
            input_enabled: AtomicBool::new(true),
            directory,
        }
    }

    /// Whether the compose input currently accepts text.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled.load(Ordering::SeqCst)
    }

    /// Consume the view and return the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lines(&self, lines: &[String]) {
        if let Ok(mut out) = self.out.lock() {
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
            let _ = out.flush();
        }
    }
}

/// Strip terminal control sequences from user-supplied text.
///
/// Content is shown verbatim otherwise; it is never interpreted.
#[must_use]
pub fn sanitize_content(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect()
}

fn message_line(message: &Message) -> String {
    let time = message_time_label(&message.sent_at, &Local);
    let who = if message.is_mine { "you" } else { "them" };
    let receipt = match message.receipt() {
        Some(ReadReceipt::Read) => " [read]",
        Some(ReadReceipt::Sent) => " [sent]",
        None => "",
    };
    format!(
        "  {time} {who}: {}{receipt}",
        sanitize_content(&message.content)
    )
}

impl<W: Write + Send> MessageView for TerminalView<W> {
    fn show_loading(&self) {
        self.write_lines(&["  loading messages...".to_string()]);
    }

    fn show_error(&self, message: &str) {
        self.write_lines(&[format!("  ! {message}")]);
    }

    fn render_messages(&self, days: &[DayGroup<'_>]) {
        if days.is_empty() {
            self.write_lines(&["  No messages yet. Write the first one!".to_string()]);
            return;
        }
        let mut lines = Vec::new();
        for day in days {
            lines.push(format!("---- {} ----", day.label));
            lines.extend(day.messages.iter().map(|message| message_line(message)));
        }
        self.write_lines(&lines);
    }

    fn append_message(&self, message: &Message) {
        self.write_lines(&[message_line(message)]);
    }

    fn distance_from_bottom(&self) -> f64 {
        0.0
    }

    fn scroll_to_bottom(&self) {}

    fn set_input_enabled(&self, enabled: bool) {
        self.input_enabled.store(enabled, Ordering::SeqCst);
    }

    fn clear_input(&self) {}

    fn show_toast(&self, message: &str, level: ToastLevel) {
        let tag = match level {
            ToastLevel::Info => "info",
            ToastLevel::Success => "ok",
            ToastLevel::Error => "error",
        };
        self.write_lines(&[format!("[{tag}] {message}")]);
    }
}

impl<W: Write + Send> ConversationListView for TerminalView<W> {
    fn show_conversations_loading(&self) {
        self.write_lines(&["  loading conversations...".to_string()]);
    }

    fn show_conversations_error(&self, message: &str) {
        self.write_lines(&[format!("  ! {message} (type /list to retry)")]);
    }

    fn render_conversations(&self, conversations: &[Conversation], active: Option<ConversationId>) {
        if conversations.is_empty() {
            self.write_lines(&["  No conversations yet.".to_string()]);
            return;
        }
        let now = Utc::now().with_timezone(&Local);
        let lines: Vec<String> = conversations
            .iter()
            .map(|conversation| {
                let marker = if Some(conversation.id) == active { '*' } else { ' ' };
                let badge = badge_label(conversation.unread_count, self.directory.badge_cap)
                    .map(|badge| format!(" ({badge})"))
                    .unwrap_or_default();
                let preview = conversation
                    .last_message_preview()
                    .map_or_else(|| "No messages".to_string(), sanitize_content);
                format!(
                    "{marker} [{}] {}{badge} {} | {}",
                    conversation.id,
                    sanitize_content(&conversation.other_party()),
                    conversation_time_label(conversation.last_message_at.as_ref(), &now),
                    truncate_preview(&preview, self.directory.preview_chars),
                )
            })
            .collect();
        self.write_lines(&lines);
    }
}

impl<W: Write + Send> NotificationView for TerminalView<W> {
    fn render_notifications(&self, notifications: &[Notification]) {
        if notifications.is_empty() {
            self.write_lines(&["  No notifications.".to_string()]);
            return;
        }
        let now = Utc::now();
        let lines: Vec<String> = notifications
            .iter()
            .map(|notification| {
                let marker = if notification.is_read { ' ' } else { '!' };
                format!(
                    "{marker} [{}] {}: {} ({})",
                    notification.kind.label(),
                    sanitize_content(&notification.title),
                    sanitize_content(&notification.message),
                    relative_time_label(&notification.created_at, &now),
                )
            })
            .collect();
        self.write_lines(&lines);
    }

    fn render_badge(&self, badge: Option<&str>) {
        if let Some(badge) = badge {
            self.write_lines(&[format!("[notifications] {badge} unread")]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::core::ids::MessageId;
    use crate::chat::view::format::group_by_day;

    fn message(id: i64, content: &str, is_mine: bool, is_read: bool) -> Message {
        Message {
            id: MessageId(id),
            conversation_id: Some(ConversationId(1)),
            content: content.to_string(),
            sent_at: Utc::now(),
            is_mine,
            is_read,
        }
    }

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap_or_default()
    }

    #[test]
    fn test_render_messages_with_receipts() {
        let view = TerminalView::new(Vec::new(), DirectoryConfig::default());
        let messages = vec![
            message(1, "Do you ship honey?", false, false),
            message(2, "Yes", true, true),
            message(3, "Tomorrow", true, false),
        ];
        let now = Utc::now().with_timezone(&Local);
        view.render_messages(&group_by_day(&messages, &now));

        let text = output(view);
        assert!(text.contains("---- Today ----"));
        assert!(text.contains("them: Do you ship honey?"));
        assert!(text.contains("you: Yes [read]"));
        assert!(text.contains("you: Tomorrow [sent]"));
    }

    #[test]
    fn test_control_characters_are_neutralised() {
        assert_eq!(sanitize_content("a\u{1b}[31mb\nc"), "a [31mb\nc");
    }

    #[test]
    fn test_render_conversations_marks_active() {
        let view = TerminalView::new(Vec::new(), DirectoryConfig::default());
        let conversations = vec![
            Conversation {
                id: ConversationId(1),
                other_user_firstname: "Anna".to_string(),
                other_user_lastname: "Nowak".to_string(),
                last_message_content: Some("Hello".to_string()),
                last_message_at: None,
                unread_count: 120,
            },
            Conversation {
                id: ConversationId(2),
                other_user_firstname: "Jan".to_string(),
                other_user_lastname: String::new(),
                last_message_content: None,
                last_message_at: None,
                unread_count: 0,
            },
        ];
        view.render_conversations(&conversations, Some(ConversationId(2)));

        let text = output(view);
        assert!(text.contains("  [1] Anna Nowak (99+)"));
        assert!(text.contains("* [2] Jan"));
        assert!(text.contains("No messages"));
    }

    #[test]
    fn test_render_notifications() {
        use crate::chat::core::ids::NotificationId;
        use crate::notifications::NotificationKind;

        let view = TerminalView::new(Vec::new(), DirectoryConfig::default());
        view.render_notifications(&[Notification {
            id: NotificationId(3),
            kind: NotificationKind::OrderShipped,
            title: "Order shipped".to_string(),
            message: "Your buckwheat honey is on its way".to_string(),
            is_read: false,
            created_at: Utc::now(),
            action_url: None,
        }]);
        view.render_badge(None);
        view.render_badge(Some("1"));

        let text = output(view);
        assert!(text.contains("! [shipped] Order shipped: Your buckwheat honey is on its way (now)"));
        assert!(text.ends_with("[notifications] 1 unread\n"));
    }

    #[test]
    fn test_input_toggle() {
        let view = TerminalView::new(Vec::new(), DirectoryConfig::default());
        view.set_input_enabled(false);
        assert!(!view.input_enabled());
        view.set_input_enabled(true);
        assert!(view.input_enabled());
    }
}
