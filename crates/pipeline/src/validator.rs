//! Post-generation answer validation.
//!
//! A grounded answer should paraphrase its context. Both texts are
//! embedded symmetrically and compared; a low score downgrades the
//! answer to the escalation message instead of serving a likely
//! hallucination.

use deskhand_core::{Embedder, EmbeddingMode};
use tracing::{debug, warn};

use crate::similarity::cosine_similarity;

/// What the validator decided.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The answer passed through unchanged.
    Accepted(String),
    /// The answer was replaced with the escalation message.
    Escalated(String),
}

impl ValidationOutcome {
    pub fn answer(&self) -> &str {
        match self {
            Self::Accepted(a) | Self::Escalated(a) => a,
        }
    }
}

/// Similarity gate between a generated answer and its source context.
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    threshold: f32,
    escalation_message: String,
}

impl AnswerValidator {
    pub fn new(threshold: f32, escalation_message: impl Into<String>) -> Self {
        Self {
            threshold,
            escalation_message: escalation_message.into(),
        }
    }

    /// Validate an answer against the context it was generated from.
    ///
    /// An empty context (greeting path) skips validation entirely. An
    /// embedding failure also passes the answer through: downgrading a
    /// possibly fine answer on a backend hiccup serves the user worse
    /// than the similarity gate it skips.
    pub async fn validate(
        &self,
        embedder: &dyn Embedder,
        answer: String,
        context: &str,
    ) -> ValidationOutcome {
        if context.is_empty() {
            return ValidationOutcome::Accepted(answer);
        }

        let answer_vec = match embedder.embed(&answer, EmbeddingMode::Paraphrase).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Answer validation skipped: embedding failed");
                return ValidationOutcome::Accepted(answer);
            }
        };
        let context_vec = match embedder.embed(context, EmbeddingMode::Paraphrase).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Answer validation skipped: embedding failed");
                return ValidationOutcome::Accepted(answer);
            }
        };

        let score = cosine_similarity(&answer_vec, &context_vec);
        if score < self.threshold {
            debug!(score, threshold = self.threshold, "Answer rejected by validator");
            ValidationOutcome::Escalated(self.escalation_message.clone())
        } else {
            ValidationOutcome::Accepted(answer)
        }
    }
}
