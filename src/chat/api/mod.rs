//! Messaging API abstraction and its HTTP implementation.

pub mod http;

pub use http::HttpChatClient;

use std::future::Future;
use std::pin::Pin;

use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::ConversationId;
use crate::chat::core::types::{
    Conversation, Message, SendMessageRequest, StartConversationRequest, StartedConversation,
};

/// Boxed future type for API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over the chat REST backend.
///
/// Implementations carry session credentials themselves; callers never pass
/// tokens.
pub trait MessagingApi: Send + Sync {
    /// List the current user's conversations, most recent first.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn list_conversations(&self) -> ApiFuture<'_, ChatResult<Vec<Conversation>>>;

    /// List every message of a conversation in chronological order.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn list_messages(&self, conversation: ConversationId)
    -> ApiFuture<'_, ChatResult<Vec<Message>>>;

    /// Post a message and return the server's canonical record.
    ///
    /// # Errors
    /// Returns an error carrying the server's `error` text on rejection.
    fn send_message(&self, request: SendMessageRequest) -> ApiFuture<'_, ChatResult<Message>>;

    /// Mark every message of a conversation as read for the current user.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn mark_read(&self, conversation: ConversationId) -> ApiFuture<'_, ChatResult<()>>;

    /// Start a conversation, resolving "already exists" to the existing id.
    ///
    /// # Errors
    /// Returns an error if the request fails for any other reason.
    fn start_conversation(
        &self,
        request: StartConversationRequest,
    ) -> ApiFuture<'_, ChatResult<StartedConversation>>;
}
