//! Binary entrypoint for the `hive-chat` terminal client.

use std::process::ExitCode;

use hive_chat::start_hive_chat;

/// Start the client; an optional first argument opens that conversation.
fn main() -> ExitCode {
    start_hive_chat::run()
}
