//! Reserved marker strings shared by the tokenizer and the learners.

/// Default joiner marker.
pub const JOINER_MARKER: &str = "￭";
/// Spacer marker, also used by SentencePiece for whitespace.
pub const SPACER_MARKER: &str = "▁";
pub const SPACER_CHAR: char = '▁';

/// Placeholder delimiters.
pub const PH_MARKER_OPEN: char = '｟';
pub const PH_MARKER_CLOSE: char = '｠';

/// Escape prefix for whitespace inside placeholders (`％0020`).
pub const ESCAPE_CHAR: char = '％';

/// Substitutes written in place of markers found in user text.
pub const JOINER_SUBSTITUTE: &str = "■";
pub const SPACER_SUBSTITUTE: &str = "_";

/// Case markup tokens.
pub const CASE_MODIFIER_CAPITALIZED: &str = "｟mrk_case_modifier_C｠";
pub const CASE_REGION_BEGIN_UPPER: &str = "｟mrk_begin_case_region_U｠";
pub const CASE_REGION_END_UPPER: &str = "｟mrk_end_case_region_U｠";

/// End-of-word suffix used by BPE merge tables.
pub const END_OF_WORD: &str = "</w>";

/// Replace reserved markers in user text with their substitutes.
pub fn substitute_markers(text: &str) -> String {
    if !contains_reserved_marker(text) {
        return text.to_string();
    }
    text.replace(JOINER_MARKER, JOINER_SUBSTITUTE)
        .replace(SPACER_MARKER, SPACER_SUBSTITUTE)
}

/// Whether the text contains the joiner or the spacer marker.
#[inline]
pub fn contains_reserved_marker(text: &str) -> bool {
    text.contains(JOINER_MARKER) || text.contains(SPACER_MARKER)
}

/// Whether the text is a placeholder token. An unclosed `｟` runs to the end
/// of the text, so only the opening marker is required.
#[inline]
pub fn is_placeholder(text: &str) -> bool {
    text.starts_with(PH_MARKER_OPEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_markers() {
        assert_eq!(substitute_markers("a￭b▁c"), "a■b_c");
        assert_eq!(substitute_markers("plain"), "plain");
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder("｟ph｠"));
        assert!(is_placeholder("｟｠"));
        assert!(is_placeholder("｟ph"));
        assert!(is_placeholder("｟"));
        assert!(!is_placeholder("ph｠"));
        assert!(!is_placeholder("a｟ph｠"));
    }
}
