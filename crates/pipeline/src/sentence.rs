//! First-sentence extraction from generated text.

/// Take the first sentence of a generated draft.
///
/// A sentence ends at `.`, `!`, or `?`; the terminator is kept. When no
/// boundary exists the whole (trimmed) draft is the answer.
pub fn first_sentence(text: &str) -> String {
    let trimmed = text.trim();
    for (idx, ch) in trimmed.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            return trimmed[..idx + ch.len_utf8()].to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_of_several() {
        assert_eq!(
            first_sentence("A VLAN is a virtual LAN. It segments traffic."),
            "A VLAN is a virtual LAN."
        );
    }

    #[test]
    fn keeps_terminator() {
        assert_eq!(first_sentence("Really? Yes."), "Really?");
        assert_eq!(first_sentence("Hello!"), "Hello!");
    }

    #[test]
    fn no_boundary_returns_all() {
        assert_eq!(first_sentence("an unterminated fragment"), "an unterminated fragment");
    }

    #[test]
    fn trims_generation_whitespace() {
        assert_eq!(first_sentence("  \n A sentence. More."), "A sentence.");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(first_sentence("   "), "");
    }
}
