//! Error types for the chat client.

use thiserror::Error;

use crate::chat::core::ids::ConversationId;

/// Chat client error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Transport-level HTTP failure (connection refused, timeout, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("server returned status {}{}", .status, detail_suffix(.message))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Human-readable `error` field from the response body, if any.
        message: Option<String>,
        /// Existing conversation id carried by a conflict response, if any.
        existing: Option<ConversationId>,
    },

    /// API base URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A message with no visible content was submitted.
    #[error("message is empty")]
    EmptyMessage,

    /// An operation needed an open conversation but none is active.
    #[error("no conversation is open")]
    NoActiveConversation,

    /// A send is already in flight for this session.
    #[error("a message is already being sent")]
    SendInProgress,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Text suitable for a transient user-facing notice.
    ///
    /// Prefers the server's own `error` field and falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::EmptyMessage | Self::NoActiveConversation | Self::SendInProgress => {
                self.to_string()
            }
            _ => fallback.to_string(),
        }
    }

    /// Existing conversation referenced by a conflict response.
    #[must_use]
    pub const fn existing_conversation(&self) -> Option<ConversationId> {
        match self {
            Self::Status { existing, .. } => *existing,
            _ => None,
        }
    }
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
