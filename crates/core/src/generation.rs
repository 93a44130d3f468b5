//! Generator trait — the abstraction over text-generation backends.
//!
//! A Generator takes a fully rendered prompt and produces a completion.
//! The pipeline treats it as a capability provider: prompt in, text out.
//! At the low temperatures used here it is deterministic enough to be
//! testable with scripted stand-ins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Parameters for a single generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The fully rendered prompt.
    pub prompt: String,

    /// Cap on newly generated tokens.
    pub max_new_tokens: u32,

    /// Sampling temperature (low for grounded answers).
    pub temperature: f32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Penalty applied to repeated tokens.
    pub repetition_penalty: f32,
}

/// The core Generator trait.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Generate a completion for the prompt.
    ///
    /// Returns only the newly generated text, never an echo of the prompt.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<String, GenerationError>;
}
