//! Annotated token model.
//!
//! A [`Token`] carries its surface text plus the boundary information needed
//! to place joiners or spacers later on. Nothing here knows about marker
//! strings; the tokenizer renders the annotations when it finalizes output.

use serde::{Deserialize, Serialize};

/// Letter-case class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Casing {
    /// No cased letter (digits, punctuation, caseless scripts).
    #[default]
    None,
    Lowercase,
    /// At least two cased letters, all uppercase.
    Uppercase,
    /// Uppercase first cased letter followed only by lowercase ones.
    /// A single uppercase letter is capitalized.
    Capitalized,
    Mixed,
}

impl Casing {
    /// Compute the casing of a piece of text.
    pub fn of(text: &str) -> Casing {
        let mut cased = 0usize;
        let mut upper = 0usize;
        let mut first_upper = false;

        for c in text.chars() {
            if c.is_uppercase() {
                if cased == 0 {
                    first_upper = true;
                }
                cased += 1;
                upper += 1;
            } else if c.is_lowercase() {
                cased += 1;
            }
        }

        match (cased, upper) {
            (0, _) => Casing::None,
            (_, 0) => Casing::Lowercase,
            (1, 1) => Casing::Capitalized,
            (c, u) if c == u => Casing::Uppercase,
            (_, 1) if first_upper => Casing::Capitalized,
            _ => Casing::Mixed,
        }
    }

    /// Whether case markup can lowercase a token of this casing and restore it.
    #[inline]
    pub fn is_restorable(self) -> bool {
        matches!(
            self,
            Casing::Lowercase | Casing::Uppercase | Casing::Capitalized
        )
    }

    /// Re-apply this casing to lowercased text.
    pub fn restore(self, text: &str) -> String {
        match self {
            Casing::Uppercase => text.to_uppercase(),
            Casing::Capitalized => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            _ => text.to_string(),
        }
    }
}

/// One token with its boundary annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Token {
    /// Text of the token, without any marker.
    pub surface: String,
    /// Casing of the original text, recorded by case markup.
    pub casing: Casing,
    /// The token is a `｟...｠` placeholder.
    pub is_placeholder: bool,
    /// Whitespace preceded the token in the input.
    pub preceded_by_space: bool,
    /// Attached to the previous token without whitespace; the joiner goes on this side.
    pub joined_left: bool,
    /// Attached to the next token without whitespace; the joiner goes on this side.
    pub joined_right: bool,
    /// The left join was introduced by a segmentation rule.
    pub segmented_left: bool,
    /// The right join was introduced by subword encoding.
    pub subword_right: bool,
    /// Markers next to this token must be standalone tokens.
    pub preserve: bool,
}

impl Token {
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            ..Default::default()
        }
    }

    /// Create a placeholder token.
    pub fn placeholder(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            is_placeholder: true,
            ..Default::default()
        }
    }

    /// Builder-style setter for [`Token::preceded_by_space`].
    pub fn with_space(mut self, preceded_by_space: bool) -> Self {
        self.preceded_by_space = preceded_by_space;
        self
    }

    /// Builder-style setter for [`Token::joined_left`].
    pub fn with_joined_left(mut self, joined: bool) -> Self {
        self.joined_left = joined;
        self
    }

    /// Builder-style setter for [`Token::joined_right`].
    pub fn with_joined_right(mut self, joined: bool) -> Self {
        self.joined_right = joined;
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surface.is_empty()
    }
}

/// Splits raw text into tokens before subword encoding.
///
/// Learners use this to see text the way the tokenizer will present it to the
/// subword encoder.
pub trait PreTokenize {
    fn pre_tokenize(&self, text: &str) -> Vec<Token>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casing_of() {
        assert_eq!(Casing::of("hello"), Casing::Lowercase);
        assert_eq!(Casing::of("HELLO"), Casing::Uppercase);
        assert_eq!(Casing::of("Hello"), Casing::Capitalized);
        assert_eq!(Casing::of("I"), Casing::Capitalized);
        assert_eq!(Casing::of("WiFi"), Casing::Mixed);
        assert_eq!(Casing::of("hELLO"), Casing::Mixed);
        assert_eq!(Casing::of("42"), Casing::None);
        assert_eq!(Casing::of("測試"), Casing::None);
        assert_eq!(Casing::of("!"), Casing::None);
    }

    #[test]
    fn test_casing_ignores_uncased_characters() {
        assert_eq!(Casing::of("Hello42"), Casing::Capitalized);
        assert_eq!(Casing::of("A1B2"), Casing::Uppercase);
        assert_eq!(Casing::of("'Tis"), Casing::Capitalized);
    }

    #[test]
    fn test_restore() {
        assert_eq!(Casing::Capitalized.restore("hello"), "Hello");
        assert_eq!(Casing::Uppercase.restore("hello"), "HELLO");
        assert_eq!(Casing::Lowercase.restore("hello"), "hello");
        assert_eq!(Casing::Capitalized.restore(""), "");
    }

    #[test]
    fn test_token_builders() {
        let token = Token::new("a").with_space(true).with_joined_right(true);
        assert!(token.preceded_by_space);
        assert!(token.joined_right);
        assert!(!token.joined_left);
        assert!(!token.is_placeholder);
        assert!(Token::placeholder("｟x｠").is_placeholder);
    }
}
