//! Wire and domain types for conversations and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::{ConversationId, MessageId, UserId};

/// Summary of a conversation as listed by the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Counterpart's first name.
    #[serde(default)]
    pub other_user_firstname: String,
    /// Counterpart's last name.
    #[serde(default)]
    pub other_user_lastname: String,
    /// Content of the most recent message, if any.
    #[serde(default)]
    pub last_message_content: Option<String>,
    /// Timestamp of the most recent message, if any.
    #[serde(default, with = "timestamp_serde::option")]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Messages the current user has not read yet.
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// Display name of the counterpart.
    #[must_use]
    pub fn other_party(&self) -> String {
        format!("{} {}", self.other_user_firstname, self.other_user_lastname)
            .trim()
            .to_string()
    }

    /// Preview text of the most recent message.
    #[must_use]
    pub fn last_message_preview(&self) -> Option<&str> {
        self.last_message_content.as_deref()
    }
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Owning conversation. Absent in some create responses.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    /// Plain-text content.
    pub content: String,
    /// When the server accepted the message.
    #[serde(with = "timestamp_serde")]
    pub sent_at: DateTime<Utc>,
    /// Whether the current user sent it.
    #[serde(default)]
    pub is_mine: bool,
    /// Whether the counterpart has read it.
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    /// Read receipt to display next to the message, if any.
    #[must_use]
    pub const fn receipt(&self) -> Option<ReadReceipt> {
        if !self.is_mine {
            return None;
        }
        if self.is_read {
            Some(ReadReceipt::Read)
        } else {
            Some(ReadReceipt::Sent)
        }
    }
}

/// Delivery state shown on the sender's own messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadReceipt {
    /// Delivered to the server only.
    Sent,
    /// Acknowledged by the counterpart.
    Read,
}

/// Body of `POST /chat/messages`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Message text.
    pub content: String,
}

/// Body of `POST /chat/conversations`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    /// User to start talking to.
    pub other_user_id: UserId,
    /// First message of the thread.
    pub initial_message: String,
}

/// Outcome of starting a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartedConversation {
    /// The server created (or returned) a conversation record.
    Created(Conversation),
    /// A conversation with that user already exists.
    Existing(ConversationId),
}

impl StartedConversation {
    /// Conversation to navigate to.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        match self {
            Self::Created(conversation) => conversation.id,
            Self::Existing(id) => *id,
        }
    }
}

/// Serde helpers for backend timestamps.
///
/// The backend emits either RFC 3339 strings or zone-less ISO-8601 local
/// date-times; the latter are taken as UTC.
pub(crate) mod timestamp_serde {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_some(&value.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {raw}"))
                }),
            }
        }
    }
}
