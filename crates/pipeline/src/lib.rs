//! The Deskhand query-processing pipeline.
//!
//! A request flows through a fixed cascade: special-phrase gates
//! (escalation, profanity, greeting), agent routing, paragraph
//! retrieval, token budgeting, prompt rendering, generation, and answer
//! validation. Each stage either short-circuits to a terminal response
//! or hands a narrower problem to the next stage.

pub mod budget;
pub mod orchestrator;
pub mod renderer;
pub mod retriever;
pub mod sentence;
pub mod similarity;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use budget::{BudgetManager, BudgetState};
pub use orchestrator::{Pipeline, PipelineResponse, TerminalState};
pub use renderer::PromptRenderer;
pub use retriever::{retrieve, RetrievalResult};
pub use similarity::{classify, cosine_similarity, PhraseMatch, ReferencePhrase};
pub use validator::{AnswerValidator, ValidationOutcome};
