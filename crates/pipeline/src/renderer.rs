//! Prompt rendering.
//!
//! Two views over the same serialization rules: the full generation
//! prompt and the history-only prefix used for token accounting. The
//! budget manager relies on `render_full` with empty context beginning
//! with exactly the `render_history_only` text, so the two functions
//! share their line formats.

use deskhand_core::{ConversationHistory, Turn};

/// Deterministic prompt serializer.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    system_instruction: String,
    bot_username: String,
}

impl PromptRenderer {
    pub fn new(system_instruction: impl Into<String>, bot_username: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            bot_username: bot_username.into(),
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// The full generation prompt: system line (with context appended
    /// when present), history turns, the question line, and the
    /// generation cue naming the assistant.
    pub fn render_full(
        &self,
        history: &ConversationHistory,
        question: &str,
        context: &str,
        username: &str,
    ) -> String {
        let mut out = String::with_capacity(
            self.system_instruction.len() + context.len() + question.len() + 64,
        );
        out.push_str(&self.system_instruction);
        if !context.is_empty() {
            out.push_str("\nContext: ");
            out.push_str(context);
        }
        out.push('\n');
        self.push_turns(&mut out, history);
        out.push_str(&self.question_line(username, question));
        out.push_str(&self.cue_line());
        out
    }

    /// The shared prefix alone: system line plus history turns, no
    /// context, question, or cue.
    pub fn render_history_only(&self, history: &ConversationHistory) -> String {
        let mut out = String::with_capacity(self.system_instruction.len() + 64);
        out.push_str(&self.system_instruction);
        out.push('\n');
        self.push_turns(&mut out, history);
        out
    }

    /// The question's own line, as it appears in the full prompt.
    pub fn question_line(&self, username: &str, question: &str) -> String {
        format!("{username}: {question}\n")
    }

    /// The generation cue line.
    pub fn cue_line(&self) -> String {
        format!("{}:", self.bot_username)
    }

    /// The fixed text that wraps a non-empty context into the prompt.
    pub fn context_marker(&self) -> &'static str {
        "\nContext: "
    }

    fn push_turns(&self, out: &mut String, history: &ConversationHistory) {
        for turn in history.turns() {
            match turn {
                Turn::User { username, message } => {
                    out.push_str(username);
                    out.push_str(": ");
                    out.push_str(message);
                }
                Turn::Assistant { answer } => {
                    out.push_str(&self.bot_username);
                    out.push_str(": ");
                    out.push_str(answer);
                }
            }
            out.push('\n');
        }
    }
}
