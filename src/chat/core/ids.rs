//! Identifier types for the chat client.
//!
//! The backend hands out numeric identifiers. Each one gets its own newtype so a
//! message id can never be passed where a conversation id is expected.

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declare a numeric newtype with a consistent API.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Extract the raw backend identifier.
            #[inline]
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

define_numeric_id!(
    /// Identifier of a two-party conversation thread.
    ConversationId
);

define_numeric_id!(
    /// Identifier of a message, unique within its conversation.
    MessageId
);

define_numeric_id!(
    /// Identifier of a marketplace user (buyer or seller).
    UserId
);

define_numeric_id!(
    /// Identifier of a notification.
    NotificationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: ConversationId = " 42 ".parse().unwrap_or(ConversationId(0));
        assert_eq!(id, ConversationId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<MessageId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId(7)).unwrap_or_default();
        assert_eq!(json, "7");
        let back: NotificationId = serde_json::from_str("13").unwrap_or(NotificationId(0));
        assert_eq!(back.get(), 13);
    }
}
