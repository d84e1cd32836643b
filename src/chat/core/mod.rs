//! Core chat types, identifiers, configuration, and errors.

pub mod config;
pub mod errors;
pub mod ids;
pub mod types;

pub use config::{ChatConfig, DirectoryConfig, SessionConfig};
pub use errors::{ChatError, ChatResult};
pub use ids::{ConversationId, MessageId, NotificationId, UserId};
pub use types::{
    Conversation, Message, ReadReceipt, SendMessageRequest, StartConversationRequest,
    StartedConversation,
};
