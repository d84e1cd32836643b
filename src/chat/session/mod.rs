//! Message pane session for one open conversation at a time.

mod conversation;
pub mod reconcile;

pub use conversation::ConversationSession;
pub use reconcile::{ReconcileAction, plan_reconcile};
