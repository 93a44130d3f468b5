//! The token budget manager.
//!
//! Decides what survives prompt assembly when system line + history +
//! question + context would overflow the context window. The question
//! and system instruction are never dropped; history is evicted oldest
//! pair first; context truncation is the bounded last resort.

use deskhand_core::{ConversationHistory, TokenCounter};
use tracing::{info, warn};

use crate::renderer::PromptRenderer;

/// Per-request accounting snapshot, in tokens of the selected agent's
/// counter.
#[derive(Debug, Clone, Copy)]
pub struct BudgetState {
    pub prompt_overhead_tokens: usize,
    pub history_tokens: usize,
    pub question_tokens: usize,
    pub context_tokens: usize,
    pub reserved_output_tokens: usize,
    pub max_total_tokens: usize,
}

impl BudgetState {
    /// Tokens the assembled prompt would occupy.
    pub fn required(&self) -> usize {
        self.prompt_overhead_tokens
            + self.history_tokens
            + self.question_tokens
            + self.context_tokens
    }

    /// Tokens available for prompt assembly.
    pub fn available(&self) -> usize {
        self.max_total_tokens.saturating_sub(self.reserved_output_tokens)
    }

    /// Whether the current allocation fits.
    pub fn fits(&self) -> bool {
        self.required() <= self.available()
    }
}

/// Shrink-to-fit allocator over the four prompt pools.
#[derive(Debug, Clone, Copy)]
pub struct BudgetManager {
    max_total_tokens: usize,
    /// Generation cap plus the fixed safety margin.
    reserved_output_tokens: usize,
}

impl BudgetManager {
    pub fn new(max_total_tokens: usize, reserved_output_tokens: usize) -> Self {
        Self {
            max_total_tokens,
            reserved_output_tokens,
        }
    }

    /// Fit history and context into the window.
    ///
    /// History lengths are always measured through the renderer so the
    /// accounting matches what generation will actually see; switching
    /// agents between requests simply re-measures under the new
    /// counter.
    ///
    /// Floor case: with history exhausted and an empty context, an
    /// oversized question is accepted as-is rather than dropped.
    pub fn fit(
        &self,
        renderer: &PromptRenderer,
        counter: &dyn TokenCounter,
        mut history: ConversationHistory,
        question: &str,
        username: &str,
        mut context: String,
    ) -> (ConversationHistory, String, BudgetState) {
        let question_tokens = counter.count(&renderer.question_line(username, question));
        let prompt_overhead_tokens =
            counter.count(renderer.context_marker()) + counter.count(&renderer.cue_line());

        let mut state = BudgetState {
            prompt_overhead_tokens,
            history_tokens: counter.count(&renderer.render_history_only(&history)),
            question_tokens,
            context_tokens: counter.count(&context),
            reserved_output_tokens: self.reserved_output_tokens,
            max_total_tokens: self.max_total_tokens,
        };

        // Oldest exchanges go first; the latest pair is evicted last.
        while !state.fits() && history.len() >= 2 {
            history = history.without_oldest_pair();
            state.history_tokens = counter.count(&renderer.render_history_only(&history));
            info!(
                remaining_turns = history.len(),
                required = state.required(),
                available = state.available(),
                "Evicted oldest history pair"
            );
        }

        if !state.fits() && !context.is_empty() {
            let max_context_tokens = state
                .available()
                .saturating_sub(state.prompt_overhead_tokens)
                .saturating_sub(state.history_tokens)
                .saturating_sub(state.question_tokens);
            context = if max_context_tokens == 0 {
                String::new()
            } else {
                counter.truncate_to_tokens(&context, max_context_tokens)
            };
            state.context_tokens = counter.count(&context);
            warn!(
                context_tokens = state.context_tokens,
                "Context truncated to remaining budget"
            );
        }

        (history, context, state)
    }
}
