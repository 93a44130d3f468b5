//! `deskhand serve` — JSON-lines worker over stdin/stdout.
//!
//! One request per line: an `InboundMessage` in, an `OutboundMessage`
//! out. The caller owns conversation history and sends it with every
//! request, so the worker stays stateless across lines.

use std::io::{BufRead, Write};

use deskhand_config::AppConfig;
use deskhand_core::{InboundMessage, OutboundMessage};
use tracing::{info, warn};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let pipeline = super::build_pipeline(&config).await?;

    info!(bot = %config.bot_username, "Serving requests on stdin");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let inbound: InboundMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Skipping malformed request line");
                continue;
            }
        };

        let username = inbound.resolved_username("User");
        let response = pipeline
            .process_query(&inbound.message, inbound.message_history, &username)
            .await;

        let outbound = OutboundMessage {
            chat_id: inbound.chat_id,
            answer: response.answer,
            bot_username: config.bot_username.clone(),
            is_manager: response.state.is_manager(),
        };

        serde_json::to_writer(&mut stdout, &outbound)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }

    Ok(())
}
