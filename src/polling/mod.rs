//! Background polling used by the chat session and the notification center.

pub mod poller;

pub use poller::{PollConfig, PollConfigBuilder, PollToken, Poller};
