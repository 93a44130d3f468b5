//! Conversation history domain types.
//!
//! A conversation is an ordered sequence of turns that strictly alternate
//! user/assistant. The history is owned by the caller: it arrives with the
//! request, a locally updated copy is returned, and nothing is persisted
//! server-side. Eviction never mutates in place — it produces a new
//! sequence, so concurrent callers never observe partial eviction.

use serde::{Deserialize, Serialize};

/// One half of a conversation exchange.
///
/// The wire shape matches the transport envelope: a user turn serializes
/// as `{"username": ..., "message": ...}` and an assistant turn as
/// `{"answer": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Turn {
    User { username: String, message: String },
    Assistant { answer: String },
}

impl Turn {
    /// Create a user turn.
    pub fn user(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
            message: message.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(answer: impl Into<String>) -> Self {
        Self::Assistant {
            answer: answer.into(),
        }
    }

    /// The text content of this turn, regardless of speaker.
    pub fn content(&self) -> &str {
        match self {
            Self::User { message, .. } => message,
            Self::Assistant { answer } => answer,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}

/// An ordered sequence of turns, alternating user/assistant.
///
/// Unbounded on input; the token budget manager bounds it on output by
/// removing the oldest user+assistant pair together — never a lone half —
/// so alternation is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append one complete exchange: a user turn followed by the
    /// assistant's answer. This is the only append operation — the
    /// pipeline never appends half a pair.
    pub fn push_exchange(
        &mut self,
        username: impl Into<String>,
        message: impl Into<String>,
        answer: impl Into<String>,
    ) {
        self.turns.push(Turn::user(username, message));
        self.turns.push(Turn::assistant(answer));
    }

    /// A copy of this history with the oldest user+assistant pair removed.
    ///
    /// Returns an unchanged copy when fewer than two turns remain; the
    /// budget manager stops evicting at that point.
    pub fn without_oldest_pair(&self) -> Self {
        if self.turns.len() < 2 {
            return self.clone();
        }
        Self {
            turns: self.turns[2..].to_vec(),
        }
    }

    /// Whether turns strictly alternate user/assistant starting with user.
    pub fn is_alternating(&self) -> bool {
        self.turns
            .iter()
            .enumerate()
            .all(|(i, t)| t.is_user() == (i % 2 == 0))
    }

    /// The username of the most recent user turn, if any.
    pub fn last_username(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::User { username, .. } => Some(username.as_str()),
            Turn::Assistant { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_exchange_keeps_alternation() {
        let mut history = ConversationHistory::new();
        history.push_exchange("alice", "How do I reset the router?", "Hold the button.");
        history.push_exchange("alice", "Which button?", "The recessed one on the back.");

        assert_eq!(history.len(), 4);
        assert!(history.is_alternating());
    }

    #[test]
    fn without_oldest_pair_removes_first_exchange() {
        let mut history = ConversationHistory::new();
        history.push_exchange("alice", "first question", "first answer");
        history.push_exchange("alice", "second question", "second answer");

        let trimmed = history.without_oldest_pair();
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.turns()[0].content(), "second question");
        assert!(trimmed.is_alternating());
        // Original untouched
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn without_oldest_pair_on_short_history_is_noop() {
        let history = ConversationHistory::from_turns(vec![Turn::user("bob", "dangling")]);
        assert_eq!(history.without_oldest_pair().len(), 1);
        assert_eq!(ConversationHistory::new().without_oldest_pair().len(), 0);
    }

    #[test]
    fn last_username_finds_most_recent_user() {
        let mut history = ConversationHistory::new();
        history.push_exchange("alice", "hi", "hello");
        history.push_exchange("bob", "hey", "hello again");
        assert_eq!(history.last_username(), Some("bob"));
        assert_eq!(ConversationHistory::new().last_username(), None);
    }

    #[test]
    fn wire_serialization_shape() {
        let mut history = ConversationHistory::new();
        history.push_exchange("alice", "What is VLAN?", "A virtual LAN.");

        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(
            json,
            r#"[{"username":"alice","message":"What is VLAN?"},{"answer":"A virtual LAN."}]"#
        );

        let parsed: ConversationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
        assert!(parsed.is_alternating());
    }

    #[test]
    fn alternation_detects_violations() {
        let bad = ConversationHistory::from_turns(vec![
            Turn::user("alice", "one"),
            Turn::user("alice", "two"),
        ]);
        assert!(!bad.is_alternating());
    }
}
