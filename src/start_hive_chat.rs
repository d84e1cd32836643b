//! Startup helpers for the `hive-chat` terminal client.
//!
//! Reads commands from stdin, renders to stdout and logs to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::chat::api::{HttpChatClient, MessagingApi};
use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::{ConversationId, UserId};
use crate::chat::directory::ConversationDirectory;
use crate::chat::session::ConversationSession;
use crate::chat::view::{ConversationListView, MessageView, TerminalView, ToastLevel};
use crate::notifications::{NotificationCenter, NotificationView, NotificationsApi};

/// Environment variable holding the backend session cookie (`name=value`).
pub const SESSION_COOKIE_ENV: &str = "HIVE_CHAT_SESSION_COOKIE";

const HELP: &str = "commands: /list  /open <id>  /filter <text>  /contact <userId> <message>  \
/reload  /notifications  /read-all  /close  /quit  (anything else is sent)";

/// A line typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Refresh the conversation list.
    List,
    /// Open a conversation.
    Open(ConversationId),
    /// Filter the conversation list.
    Filter(String),
    /// Start (or find) a conversation with a user.
    Contact(UserId, String),
    /// Force a re-render of the open conversation.
    Reload,
    /// Show the notification list.
    Notifications,
    /// Mark every notification read.
    ReadAll,
    /// Close the open conversation.
    Close,
    /// Leave the client.
    Quit,
    /// Send the line to the open conversation.
    Send(String),
    /// A command with missing or malformed arguments.
    Invalid(&'static str),
}

/// Parse one input line.
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "list" => Command::List,
        "open" => rest
            .parse()
            .map_or(Command::Invalid("usage: /open <conversationId>"), Command::Open),
        "filter" => Command::Filter(rest.to_string()),
        "contact" => {
            let parsed = rest.split_once(char::is_whitespace).and_then(|(user, message)| {
                user.parse::<UserId>()
                    .ok()
                    .map(|user| (user, message.trim().to_string()))
            });
            match parsed {
                Some((user, message)) if !message.is_empty() => Command::Contact(user, message),
                _ => Command::Invalid("usage: /contact <userId> <message>"),
            }
        }
        "reload" => Command::Reload,
        "notifications" => Command::Notifications,
        "read-all" => Command::ReadAll,
        "close" => Command::Close,
        "quit" | "exit" => Command::Quit,
        _ => Command::Invalid(HELP),
    }
}

/// Run the terminal client.
///
/// # Returns
/// `ExitCode::SUCCESS` on a clean exit, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting hive-chat v{}", env!("CARGO_PKG_VERSION"));

    let config = ChatConfig::from_env();
    info!(api_base = %config.api_base, "Chat backend");

    let first = match std::env::args().nth(1).map(|raw| raw.parse::<ConversationId>()) {
        None => None,
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            error!("Invalid conversation id argument: {e}");
            return ExitCode::from(2);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_terminal(config, first)) {
        error!("Chat client error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

struct Client {
    view: Arc<TerminalView<std::io::Stdout>>,
    directory: Arc<ConversationDirectory>,
    session: ConversationSession,
    notifications: NotificationCenter,
}

async fn run_terminal(config: ChatConfig, first: Option<ConversationId>) -> ChatResult<()> {
    let client = Arc::new(HttpChatClient::new(&config)?);
    match std::env::var(SESSION_COOKIE_ENV) {
        Ok(cookie) => client.add_session_cookie(&cookie),
        Err(_) => warn!("{SESSION_COOKIE_ENV} is not set; requests will be anonymous"),
    }

    let view = Arc::new(TerminalView::new(std::io::stdout(), config.directory.clone()));
    let directory = Arc::new(ConversationDirectory::new(
        Arc::clone(&client) as Arc<dyn MessagingApi>,
        Arc::clone(&view) as Arc<dyn ConversationListView>,
        config.directory.clone(),
    ));
    let app = Client {
        session: ConversationSession::new(
            Arc::clone(&client) as Arc<dyn MessagingApi>,
            Arc::clone(&view) as Arc<dyn MessageView>,
            Arc::clone(&directory),
            config.session.clone(),
        ),
        notifications: NotificationCenter::new(
            Arc::clone(&client) as Arc<dyn NotificationsApi>,
            Arc::clone(&view) as Arc<dyn NotificationView>,
            &config,
        ),
        view,
        directory,
    };

    app.view.show_toast(HELP, ToastLevel::Info);
    // a failed first load is already rendered as an error state
    if app.directory.refresh().await.is_ok() {
        app.show_unread_total().await;
    }
    if let Err(e) = app.notifications.load().await {
        warn!("Initial notification load failed: {e}");
    }
    app.notifications.start_polling();
    if let Some(id) = first {
        app.session.open(id).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !app.handle(parse_command(&line)).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    app.notifications.stop_polling();
    app.session.close().await;
    info!("hive-chat stopped");
    Ok(())
}

impl Client {
    /// Execute one command; `false` ends the loop.
    async fn handle(&self, command: Command) -> bool {
        match command {
            Command::List => {
                if self.directory.refresh().await.is_ok() {
                    self.show_unread_total().await;
                }
            }
            Command::Open(id) => self.session.open(id).await,
            Command::Filter(query) => self.directory.set_filter(&query).await,
            Command::Contact(user, message) => {
                match self.directory.start_conversation(user, &message).await {
                    Ok(id) => self.session.open(id).await,
                    Err(err) => self.view.show_toast(
                        &err.user_message("Could not start the conversation"),
                        ToastLevel::Error,
                    ),
                }
            }
            Command::Reload => self.session.reload().await,
            Command::Notifications => {
                let _ = self.notifications.load().await;
            }
            Command::ReadAll => {
                if self.notifications.mark_all_read().await.is_ok() {
                    self.view
                        .show_toast("All notifications marked read", ToastLevel::Success);
                }
            }
            Command::Close => self.session.close().await,
            Command::Quit => return false,
            Command::Invalid(usage) => self.view.show_toast(usage, ToastLevel::Info),
            Command::Send(text) => match self.session.send(&text).await {
                Ok(_) | Err(ChatError::EmptyMessage) => {}
                Err(err @ (ChatError::NoActiveConversation | ChatError::SendInProgress)) => {
                    self.view.show_toast(&err.to_string(), ToastLevel::Info);
                }
                // the session already showed the failure
                Err(_) => {}
            },
        }
        true
    }

    async fn show_unread_total(&self) {
        if let Some(badge) = self.directory.unread_badge().await {
            self.view
                .show_toast(&unread_total_label(&badge), ToastLevel::Info);
        }
    }
}

fn unread_total_label(badge: &str) -> String {
    format!("{badge} unread messages")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_sent_verbatim() {
        assert_eq!(
            parse_command("  is the honey raw? "),
            Command::Send("  is the honey raw? ".to_string())
        );
    }

    #[test]
    fn test_open_and_filter() {
        assert_eq!(parse_command("/open 12"), Command::Open(ConversationId(12)));
        assert!(matches!(parse_command("/open twelve"), Command::Invalid(_)));
        assert_eq!(
            parse_command("/filter  Anna "),
            Command::Filter("Anna".to_string())
        );
        assert_eq!(parse_command("/filter"), Command::Filter(String::new()));
    }

    #[test]
    fn test_contact() {
        assert_eq!(
            parse_command("/contact 7 Do you sell pollen?"),
            Command::Contact(UserId(7), "Do you sell pollen?".to_string())
        );
        assert!(matches!(parse_command("/contact 7"), Command::Invalid(_)));
        assert!(matches!(parse_command("/contact x hi"), Command::Invalid(_)));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/list"), Command::List);
        assert_eq!(parse_command("/close"), Command::Close);
        assert_eq!(parse_command("/reload"), Command::Reload);
        assert_eq!(parse_command("/notifications"), Command::Notifications);
        assert_eq!(parse_command("/read-all"), Command::ReadAll);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/bogus"), Command::Invalid(HELP));
    }

    #[test]
    fn test_unread_total_label() {
        assert_eq!(unread_total_label("3"), "3 unread messages");
        assert_eq!(unread_total_label("99+"), "99+ unread messages");
    }
}
