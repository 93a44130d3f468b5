//! Token accounting — the tokenizer-equivalent length function.
//!
//! Every agent owns a `TokenCounter` alongside its generation capability;
//! the budget manager measures history, question, and context with the
//! counter of the currently selected agent. Switching agents mid-conversation
//! re-measures under the new counter — lengths are never cached across
//! agent switches.

/// Token length function with its inverse-ish truncation, used only by
/// the context-truncation fallback.
pub trait TokenCounter: Send + Sync {
    /// Token count for a string.
    fn count(&self, text: &str) -> usize;

    /// Truncate `text` to at most `max_tokens` tokens, from the start.
    fn truncate_to_tokens(&self, text: &str, max_tokens: usize) -> String;
}

/// Character-based heuristic counter: ~4 characters per token, rounded up.
///
/// Accurate within ~10% for BPE tokenizers on English text. Used when an
/// agent has no exact tokenizer endpoint to count against.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        (text.len() + 3) / 4
    }

    fn truncate_to_tokens(&self, text: &str, max_tokens: usize) -> String {
        let max_bytes = max_tokens.saturating_mul(4);
        if text.len() <= max_bytes {
            return text.to_string();
        }
        let mut cut = max_bytes;
        while cut > 0 && !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text[..cut].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(HeuristicCounter.count(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(HeuristicCounter.count("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(HeuristicCounter.count("hello"), 2);
    }

    #[test]
    fn hundred_chars() {
        let text = "a".repeat(100);
        assert_eq!(HeuristicCounter.count(&text), 25);
    }

    #[test]
    fn truncate_respects_budget() {
        let text = "a".repeat(100);
        let truncated = HeuristicCounter.truncate_to_tokens(&text, 10);
        assert_eq!(truncated.len(), 40);
        assert_eq!(HeuristicCounter.count(&truncated), 10);
    }

    #[test]
    fn truncate_short_text_is_identity() {
        assert_eq!(HeuristicCounter.truncate_to_tokens("short", 100), "short");
    }

    #[test]
    fn truncate_to_zero_is_empty() {
        assert_eq!(HeuristicCounter.truncate_to_tokens("anything", 0), "");
    }

    #[test]
    fn truncate_lands_on_char_boundary() {
        // Multibyte characters must not be split mid-sequence.
        let text = "é".repeat(50); // 2 bytes each
        let truncated = HeuristicCounter.truncate_to_tokens(&text, 3);
        assert!(truncated.len() <= 12);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
