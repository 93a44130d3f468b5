//! Paragraph retrieval within a selected agent's corpus.
//!
//! Single best-match retrieval: argmax of cosine similarity over the
//! agent's paragraph embeddings, gated by a minimum similarity. The
//! query vector must be a query-mode encoding; the corpus holds
//! document-mode encodings. Asymmetric by design.

use deskhand_agents::Agent;
use tracing::debug;

use crate::similarity::cosine_similarity;

/// The outcome of a retrieval pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalResult {
    /// The best paragraph and its length under the agent's counter.
    Retrieved {
        paragraph: String,
        token_count: usize,
        score: f32,
    },
    /// Nothing scored at or above the gate.
    NoMatch,
}

impl RetrievalResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Retrieved { .. })
    }
}

/// Retrieve the single best-matching paragraph for a query vector.
///
/// Deterministic for a fixed corpus: ties break to the first-seen
/// paragraph index.
pub fn retrieve(query: &[f32], agent: &Agent, threshold: f32) -> RetrievalResult {
    let mut best_index: Option<usize> = None;
    let mut best_score = f32::MIN;

    for (index, embedding) in agent.embeddings().iter().enumerate() {
        let score = cosine_similarity(query, embedding);
        if score > best_score {
            best_score = score;
            best_index = Some(index);
        }
    }

    match best_index {
        Some(index) if best_score >= threshold => {
            let paragraph = agent.paragraphs()[index].clone();
            let token_count = agent.counter().count(&paragraph);
            debug!(
                agent = agent.name(),
                index,
                score = best_score,
                tokens = token_count,
                "Paragraph retrieved"
            );
            RetrievalResult::Retrieved {
                paragraph,
                token_count,
                score: best_score,
            }
        }
        _ => {
            debug!(agent = agent.name(), score = best_score, "No paragraph above gate");
            RetrievalResult::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{keyed_embedder, load_test_registry, stub_generator};

    #[tokio::test]
    async fn retrieves_best_paragraph() {
        let embedder = keyed_embedder(&[
            ("VLANs segment a network into isolated broadcast domains.", vec![0.0, 0.0, 1.0, 0.0]),
            ("DHCP assigns IP addresses automatically.", vec![0.0, 1.0, 0.0, 0.0]),
        ]);
        let registry = load_test_registry(
            "Network",
            &[
                "VLANs segment a network into isolated broadcast domains.",
                "DHCP assigns IP addresses automatically.",
            ],
            &embedder,
            stub_generator(),
        )
        .await;
        let agent = registry.get("Network").unwrap();

        let result = retrieve(&[0.0, 0.0, 1.0, 0.0], agent, 0.25);
        match result {
            RetrievalResult::Retrieved {
                paragraph,
                token_count,
                score,
            } => {
                assert!(paragraph.starts_with("VLANs"));
                assert!(token_count > 0);
                assert!(score > 0.99);
            }
            RetrievalResult::NoMatch => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn below_gate_is_no_match() {
        let embedder = keyed_embedder(&[("Only paragraph.", vec![0.0, 0.0, 1.0, 0.0])]);
        let registry =
            load_test_registry("Network", &["Only paragraph."], &embedder, stub_generator()).await;

        // Nearly orthogonal query, similarity ~0.2.
        let result = retrieve(
            &[0.98, 0.0, 0.2, 0.0],
            registry.get("Network").unwrap(),
            0.25,
        );
        assert_eq!(result, RetrievalResult::NoMatch);
    }

    #[tokio::test]
    async fn ties_break_to_first_paragraph() {
        let embedder = keyed_embedder(&[
            ("First twin.", vec![0.0, 0.0, 1.0, 0.0]),
            ("Second twin.", vec![0.0, 0.0, 1.0, 0.0]),
        ]);
        let registry = load_test_registry(
            "Network",
            &["First twin.", "Second twin."],
            &embedder,
            stub_generator(),
        )
        .await;

        match retrieve(&[0.0, 0.0, 1.0, 0.0], registry.get("Network").unwrap(), 0.25) {
            RetrievalResult::Retrieved { paragraph, .. } => {
                assert_eq!(paragraph, "First twin.")
            }
            RetrievalResult::NoMatch => panic!("expected a match"),
        }
    }
}
