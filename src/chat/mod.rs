//! Two-pane chat: conversation directory on one side, the open conversation
//! on the other.

pub mod api;
pub mod core;
pub mod directory;
pub mod session;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpChatClient, MessagingApi};
pub use core::{ChatConfig, ChatError, ChatResult, ConversationId, Message, UserId};
pub use directory::ConversationDirectory;
pub use session::ConversationSession;
pub use view::{ConversationListView, MessageView, TerminalView, ToastLevel};
