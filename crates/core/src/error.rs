//! Error types for the Deskhand domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Conditions the pipeline
//! recovers from locally (empty query, below-threshold routing) are states,
//! not errors — they never appear here.

use thiserror::Error;

/// The top-level error type for all Deskhand operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Vector store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Corpus loading errors ---
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from an embedding backend. Never fatal at request time:
/// the pipeline treats them as "no route found" at the stage where
/// they occur.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(String),

    #[error("Malformed embedding vector: {0}")]
    Malformed(String),

    #[error("Embedding backend returned no vectors")]
    Empty,
}

/// Failures from a generation backend. Caught at the orchestrator
/// boundary and surfaced as a fixed error message; never retried.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation backend failed: {0}")]
    Backend(String),

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed generation output: {0}")]
    MalformedOutput(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Corpus for agent '{agent}' contains no paragraphs")]
    EmptyCorpus { agent: String },

    #[error("Corpus/embedding mismatch for agent '{agent}': {paragraphs} paragraphs, {embeddings} embeddings")]
    EmbeddingMismatch {
        agent: String,
        paragraphs: usize,
        embeddings: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_error_displays_correctly() {
        let err = Error::Embedding(EmbeddingError::Malformed(
            "non-finite component at index 3".into(),
        ));
        assert!(err.to_string().contains("non-finite"));
        assert!(err.to_string().contains("Embedding"));
    }

    #[test]
    fn generation_timeout_displays_seconds() {
        let err = Error::Generation(GenerationError::Timeout(30));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn corpus_mismatch_displays_counts() {
        let err = Error::Corpus(CorpusError::EmbeddingMismatch {
            agent: "Network".into(),
            paragraphs: 12,
            embeddings: 11,
        });
        assert!(err.to_string().contains("Network"));
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("11"));
    }
}
