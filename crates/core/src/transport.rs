//! Transport envelopes — the message-queue boundary.
//!
//! The queue client itself is out of scope; these are the serde shapes a
//! worker consumes and produces. Field names are camelCase on the wire to
//! match the chat-service contract.

use serde::{Deserialize, Serialize};

use crate::history::ConversationHistory;

/// An inbound request from the chat service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// The user's message text.
    pub message: String,

    /// The running conversation history, caller-owned.
    #[serde(default)]
    pub message_history: ConversationHistory,

    /// Opaque chat identifier, echoed back on the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// Who is asking. When absent, falls back to the most recent user
    /// turn in the supplied history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl InboundMessage {
    /// Resolve the effective username for this request.
    pub fn resolved_username(&self, fallback: &str) -> String {
        self.username
            .as_deref()
            .or_else(|| self.message_history.last_username())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// The outbound response to the chat service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Echoed chat identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// The answer text.
    pub answer: String,

    /// Display name of the bot.
    pub bot_username: String,

    /// True exactly when the request was escalated to a human specialist,
    /// either by phrase match or by the post-generation downgrade.
    pub is_manager: bool,
}
