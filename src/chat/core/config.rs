//! Configuration for the chat client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::core::errors::{ChatError, ChatResult};

/// Default REST API base.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Environment variable overriding the API base.
pub const API_BASE_ENV: &str = "HIVE_CHAT_API_BASE";
/// Environment variable overriding the message poll interval (milliseconds).
pub const POLL_MS_ENV: &str = "HIVE_CHAT_POLL_MS";
/// Environment variable overriding the read settle delay (milliseconds).
pub const SETTLE_MS_ENV: &str = "HIVE_CHAT_SETTLE_MS";

/// Top-level configuration for the chat client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL every API path is resolved against.
    pub api_base: String,
    /// Whole-request timeout.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Session behaviour.
    pub session: SessionConfig,
    /// Directory and badge rendering.
    pub directory: DirectoryConfig,
    /// Interval between notification unread-count refreshes.
    #[serde(with = "duration_ms")]
    pub notification_poll_interval: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            session: SessionConfig::default(),
            directory: DirectoryConfig::default(),
            notification_poll_interval: Duration::from_secs(30),
        }
    }
}

impl ChatConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from defaults overridden by `HIVE_CHAT_*` variables.
    ///
    /// Unparseable numeric overrides are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.api_base = base;
        }
        if let Some(ms) = read_millis(POLL_MS_ENV) {
            config.session.poll_interval = ms;
        }
        if let Some(ms) = read_millis(SETTLE_MS_ENV) {
            config.session.read_settle_delay = ms;
        }
        config
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the message poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.session.poll_interval = interval;
        self
    }

    /// Set the delay between the read-mark request and the settle fetch.
    #[must_use]
    pub const fn with_read_settle_delay(mut self, delay: Duration) -> Self {
        self.session.read_settle_delay = delay;
        self
    }

    /// Parsed API base, normalised to end with a slash so relative joins keep
    /// the base path.
    ///
    /// # Errors
    /// Returns an error if the base is not an absolute URL.
    pub fn api_base_url(&self) -> ChatResult<Url> {
        let mut base = self.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        let url = self.api_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidConfig(format!(
                "api_base must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.session.poll_interval.is_zero() {
            return Err(ChatError::InvalidConfig(
                "session.poll_interval must be > 0".to_string(),
            ));
        }

        if self.notification_poll_interval.is_zero() {
            return Err(ChatError::InvalidConfig(
                "notification_poll_interval must be > 0".to_string(),
            ));
        }

        if self.directory.badge_cap == 0 {
            return Err(ChatError::InvalidConfig(
                "directory.badge_cap must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Timing and scroll settings for an open conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between background message refreshes.
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
    /// Grace period after marking a conversation read before re-fetching.
    #[serde(with = "duration_ms")]
    pub read_settle_delay: Duration,
    /// Distance from the bottom edge (pixels) still counted as "at bottom".
    pub near_bottom_threshold_px: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            read_settle_delay: Duration::from_millis(500),
            near_bottom_threshold_px: 50.0,
        }
    }
}

/// Conversation list rendering settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Counts above this are shown as `"{cap}+"`.
    pub badge_cap: u32,
    /// Maximum characters of a last-message preview.
    pub preview_chars: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            badge_cap: 99,
            preview_chars: 50,
        }
    }
}

fn read_millis(var: &str) -> Option<Duration> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(err) => {
            tracing::warn!(var, value = %raw, %err, "Ignoring invalid duration override");
            None
        }
    }
}

/// Serde module for `Duration` as integer milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.session.poll_interval, Duration::from_millis(3000));
        assert_eq!(config.session.read_settle_delay, Duration::from_millis(500));
        assert!((config.session.near_bottom_threshold_px - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.directory.badge_cap, 99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ChatConfig::new()
            .with_api_base("https://hive.example/api")
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(1000))
            .with_read_settle_delay(Duration::from_millis(250));

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.session.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.session.read_settle_delay, Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_base_keeps_path() {
        let config = ChatConfig::new().with_api_base("http://localhost:8080/api");
        let joined = config
            .api_base_url()
            .and_then(|base| Ok(base.join("chat/conversations")?));
        assert_eq!(
            joined.map(|url| url.to_string()).unwrap_or_default(),
            "http://localhost:8080/api/chat/conversations"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ChatConfig::new().with_api_base("not a url").validate().is_err());
        assert!(ChatConfig::new().with_api_base("ftp://x/api").validate().is_err());
        assert!(
            ChatConfig::new()
                .with_poll_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let json = serde_json::to_value(ChatConfig::default()).unwrap_or_default();
        assert_eq!(json["session"]["poll_interval"], 3000);
        assert_eq!(json["request_timeout"], 30_000);

        let partial: ChatConfig =
            serde_json::from_str(r#"{"session": {"read_settle_delay": 750}}"#)
                .unwrap_or_default();
        assert_eq!(partial.session.read_settle_delay, Duration::from_millis(750));
        assert_eq!(partial.session.poll_interval, Duration::from_millis(3000));
    }
}
