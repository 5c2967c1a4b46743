//! Placeholder escaping.
//!
//! Whitespace inside a placeholder is written as `％XXXX` (four uppercase hex
//! digits of the code point) so the placeholder survives as a single token.

use joinery_core::markers::{substitute_markers, ESCAPE_CHAR, PH_MARKER_CLOSE, PH_MARKER_OPEN};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::OnceLock;

/// Append `text` to `out`, escaping whitespace characters.
pub fn escape_whitespace(text: &str, out: &mut String) {
    for c in text.chars() {
        if c.is_whitespace() {
            // Writing to a String cannot fail.
            let _ = write!(out, "{}{:04X}", ESCAPE_CHAR, c as u32);
        } else {
            out.push(c);
        }
    }
}

fn escape_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new("％([0-9A-Fa-f]{4})").ok()).as_ref()
}

/// Replace `％XXXX` sequences with the characters they encode.
///
/// Sequences that do not encode a valid character are kept as is.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains(ESCAPE_CHAR) {
        return Cow::Borrowed(text);
    }
    let Some(re) = escape_regex() else {
        return Cow::Borrowed(text);
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    })
}

/// Substitute reserved markers everywhere except inside placeholders.
pub fn substitute_outside_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut plain = String::new();
    let mut in_placeholder = false;

    for c in text.chars() {
        if in_placeholder {
            out.push(c);
            in_placeholder = c != PH_MARKER_CLOSE;
        } else if c == PH_MARKER_OPEN {
            out.push_str(&substitute_markers(&plain));
            plain.clear();
            out.push(c);
            in_placeholder = true;
        } else {
            plain.push(c);
        }
    }
    out.push_str(&substitute_markers(&plain));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_whitespace() {
        let mut out = String::from("｟");
        escape_whitespace("a b\tc", &mut out);
        assert_eq!(out, "｟a％0020b％0009c");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("｟a％0020b｠"), "｟a b｠");
        assert_eq!(unescape("｟a％00e9｠"), "｟aé｠");
        assert_eq!(unescape("plain"), "plain");
        // Surrogates are not characters
        assert_eq!(unescape("％D800"), "％D800");
    }

    #[test]
    fn test_substitute_outside_placeholders() {
        assert_eq!(
            substitute_outside_placeholders("a￭ ｟b￭▁｠ ▁c"),
            "a■ ｟b￭▁｠ _c"
        );
    }
}
