//! Similarity classification over small labeled phrase sets.
//!
//! The same primitive backs all four decision points: the escalation,
//! profanity, and greeting gates (threshold 0.7) and agent routing
//! (threshold 0.25). Pure functions; embedding happens upstream.

/// A labeled reference phrase with its precomputed vector.
#[derive(Debug, Clone)]
pub struct ReferencePhrase {
    pub phrase: String,
    pub vector: Vec<f32>,
}

impl ReferencePhrase {
    pub fn new(phrase: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            phrase: phrase.into(),
            vector,
        }
    }
}

/// The winning phrase of a classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseMatch {
    /// Index of the winning phrase in the reference set.
    pub index: usize,
    pub phrase: String,
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Accumulates in f64 to keep long-vector sums stable. Returns 0.0 for
/// mismatched lengths or zero-magnitude inputs, which scores below every
/// threshold in use.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Find the best-matching reference phrase at or above `threshold`.
///
/// Stable argmax: on an equal maximum score the first-seen phrase wins.
pub fn classify(
    query: &[f32],
    references: &[ReferencePhrase],
    threshold: f32,
) -> Option<PhraseMatch> {
    let mut best: Option<PhraseMatch> = None;

    for (index, reference) in references.iter().enumerate() {
        let score = cosine_similarity(query, &reference.vector);
        let beats_current = match &best {
            Some(current) => score > current.score,
            None => true,
        };
        if beats_current {
            best = Some(PhraseMatch {
                index,
                phrase: reference.phrase.clone(),
                score,
            });
        }
    }

    best.filter(|m| m.score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(vectors: &[(&str, Vec<f32>)]) -> Vec<ReferencePhrase> {
        vectors
            .iter()
            .map(|(p, v)| ReferencePhrase::new(*p, v.clone()))
            .collect()
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn classify_returns_best_above_threshold() {
        let references = refs(&[
            ("near", vec![0.9, 0.1]),
            ("exact", vec![1.0, 0.0]),
            ("far", vec![0.0, 1.0]),
        ]);
        let result = classify(&[1.0, 0.0], &references, 0.7).unwrap();
        assert_eq!(result.phrase, "exact");
        assert_eq!(result.index, 1);
        assert!(result.score > 0.99);
    }

    #[test]
    fn classify_below_threshold_is_none() {
        let references = refs(&[("far", vec![0.0, 1.0])]);
        assert!(classify(&[1.0, 0.0], &references, 0.25).is_none());
    }

    #[test]
    fn classify_empty_references_is_none() {
        assert!(classify(&[1.0, 0.0], &[], 0.0).is_none());
    }

    #[test]
    fn tie_breaks_to_first_seen() {
        let references = refs(&[("first", vec![1.0, 0.0]), ("second", vec![1.0, 0.0])]);
        let result = classify(&[1.0, 0.0], &references, 0.5).unwrap();
        assert_eq!(result.phrase, "first");
        assert_eq!(result.index, 0);
    }

    #[test]
    fn classification_is_deterministic() {
        let references = refs(&[("a", vec![0.7, 0.7]), ("b", vec![0.5, 0.9])]);
        let query = [0.6, 0.8];
        let first = classify(&query, &references, 0.0);
        let second = classify(&query, &references, 0.0);
        assert_eq!(first, second);
    }
}
