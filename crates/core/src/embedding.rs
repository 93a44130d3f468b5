//! Embedder trait — the abstraction over embedding backends.
//!
//! An Embedder turns text into a normalized fixed-dimension vector.
//! The `document` and `query` modes are asymmetric encodings: corpus
//! paragraphs are embedded once as documents, while requests are embedded
//! as queries. Mixing the modes degrades retrieval quality but not the
//! correctness of the algorithm. `paraphrase` mode is symmetric and used
//! for phrase classification and answer validation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// How a text should be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Corpus paragraphs ("search document" encoding).
    Document,
    /// Retrieval queries ("search query" encoding).
    Query,
    /// Symmetric sentence-similarity encoding.
    Paraphrase,
}

impl EmbeddingMode {
    /// The conventional task name for this mode, used by backends that
    /// express the mode as an instruction prefix.
    pub fn task_name(&self) -> &'static str {
        match self {
            Self::Document => "search_document",
            Self::Query => "search_query",
            Self::Paraphrase => "paraphrase",
        }
    }
}

/// The core Embedder trait.
///
/// Implementations: OpenAI-compatible HTTP backends, scripted mocks for
/// tests.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Embed a single text in the given mode.
    async fn embed(
        &self,
        text: &str,
        mode: EmbeddingMode,
    ) -> std::result::Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of texts in the given mode, one vector per input.
    ///
    /// Default implementation embeds sequentially; backends with a native
    /// batch endpoint should override it.
    async fn embed_batch(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, mode).await?);
        }
        Ok(out)
    }
}

/// Check that a vector is usable: non-empty with only finite components.
///
/// Backends occasionally produce NaN vectors for degenerate inputs; the
/// pipeline checks at each call site and downgrades to "no route found"
/// rather than propagating a fatal error.
pub fn validate_vector(vector: &[f32]) -> std::result::Result<(), EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    if let Some(idx) = vector.iter().position(|v| !v.is_finite()) {
        return Err(EmbeddingError::Malformed(format!(
            "non-finite component at index {idx}"
        )));
    }
    Ok(())
}
