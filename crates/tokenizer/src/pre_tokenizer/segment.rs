//! Further splitting of raw tokens at case, digit and alphabet transitions.

use crate::tokenizer::{Flags, Mode};
use joinery_core::{Alphabet, CharClass, Token};
use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

/// Splits raw tokens at character class transitions.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    case: bool,
    numbers: bool,
    isolate_digits: bool,
    alphabet_change: bool,
    alphabets: BTreeSet<Alphabet>,
}

impl Segmenter {
    pub fn new(flags: &Flags, mode: Mode, alphabets: &BTreeSet<Alphabet>) -> Self {
        Self {
            case: flags.splits_case(),
            numbers: flags.segment_numbers,
            isolate_digits: flags.segment_numbers && mode == Mode::Aggressive,
            alphabet_change: flags.segment_alphabet_change,
            alphabets: alphabets.clone(),
        }
    }

    /// Whether any split rule is enabled.
    pub fn is_active(&self) -> bool {
        self.case || self.numbers || self.alphabet_change || !self.alphabets.is_empty()
    }

    /// Split every non-placeholder token at its segmentation points.
    ///
    /// Pieces after the first are joined to their left neighbor and flagged
    /// as segmentation splits.
    pub fn segment(&self, tokens: Vec<Token>) -> Vec<Token> {
        if !self.is_active() {
            return tokens;
        }
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.is_placeholder {
                out.push(token);
                continue;
            }
            let parts = self.split_surface(&token.surface);
            if parts.len() <= 1 {
                out.push(token);
                continue;
            }
            let last = parts.len() - 1;
            for (idx, part) in parts.into_iter().enumerate() {
                let mut piece = Token::new(part);
                if idx == 0 {
                    piece.preceded_by_space = token.preceded_by_space;
                    piece.joined_left = token.joined_left;
                    piece.segmented_left = token.segmented_left;
                } else {
                    piece.joined_left = true;
                    piece.segmented_left = true;
                }
                if idx == last {
                    piece.joined_right = token.joined_right;
                }
                out.push(piece);
            }
        }
        out
    }

    fn split_surface<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let graphemes: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
        let classes: Vec<CharClass> = graphemes
            .iter()
            .map(|(_, g)| g.chars().next().map_or(CharClass::Other, CharClass::of))
            .collect();

        let mut parts = Vec::new();
        let mut start = 0;
        for idx in 1..graphemes.len() {
            if self.is_boundary(&graphemes, &classes, idx) {
                let offset = graphemes[idx].0;
                parts.push(&text[start..offset]);
                start = offset;
            }
        }
        if start < text.len() {
            parts.push(&text[start..]);
        }
        parts
    }

    /// Whether a split falls between grapheme `idx - 1` and grapheme `idx`.
    fn is_boundary(&self, graphemes: &[(usize, &str)], classes: &[CharClass], idx: usize) -> bool {
        let (prev, cur) = (classes[idx - 1], classes[idx]);

        if self.numbers {
            match (prev, cur) {
                (CharClass::Digit, CharClass::Letter(_)) | (CharClass::Letter(_), CharClass::Digit) => {
                    return true
                }
                (CharClass::Digit, CharClass::Digit) if self.isolate_digits => return true,
                _ => {}
            }
        }

        if let (CharClass::Letter(a), CharClass::Letter(b)) = (prev, cur) {
            if self.alphabet_change && a != b {
                return true;
            }
            if self.case {
                let first = |i: usize| graphemes.get(i).and_then(|(_, g)| g.chars().next());
                let (Some(p), Some(c)) = (first(idx - 1), first(idx)) else {
                    return false;
                };
                if p.is_lowercase() && c.is_uppercase() {
                    return true;
                }
                // "HTMLParser" splits before the last capital of a run
                if p.is_uppercase()
                    && c.is_uppercase()
                    && first(idx + 1).is_some_and(char::is_lowercase)
                {
                    return true;
                }
            }
        }

        if !self.alphabets.is_empty() {
            let listed = |class: CharClass| {
                class
                    .alphabet()
                    .is_some_and(|alphabet| self.alphabets.contains(&alphabet))
            };
            if listed(prev) || listed(cur) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(flags: Flags, mode: Mode, alphabets: &[Alphabet], token: Token) -> Vec<Token> {
        let alphabets = alphabets.iter().copied().collect();
        Segmenter::new(&flags, mode, &alphabets).segment(vec![token])
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    #[test]
    fn test_inactive_passthrough() {
        let tokens = segment(Flags::default(), Mode::Conservative, &[], Token::new("abc123"));
        assert_eq!(surfaces(&tokens), vec!["abc123"]);
    }

    #[test]
    fn test_segment_case() {
        let flags = Flags {
            segment_case: true,
            ..Default::default()
        };
        let tokens = segment(flags, Mode::Conservative, &[], Token::new("WiFiHTMLParser"));
        assert_eq!(surfaces(&tokens), vec!["Wi", "Fi", "HTML", "Parser"]);
        assert!(tokens[1].joined_left);
        assert!(tokens[1].segmented_left);
        assert!(!tokens[0].segmented_left);
    }

    #[test]
    fn test_segment_numbers() {
        let flags = Flags {
            segment_numbers: true,
            ..Default::default()
        };
        let tokens = segment(flags, Mode::Conservative, &[], Token::new("abc123"));
        assert_eq!(surfaces(&tokens), vec!["abc", "123"]);

        let tokens = segment(flags, Mode::Aggressive, &[], Token::new("123"));
        assert_eq!(surfaces(&tokens), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_segment_alphabet_change() {
        let flags = Flags {
            segment_alphabet_change: true,
            ..Default::default()
        };
        let tokens = segment(flags, Mode::Conservative, &[], Token::new("abcабв"));
        assert_eq!(surfaces(&tokens), vec!["abc", "абв"]);
    }

    #[test]
    fn test_segment_alphabet() {
        let tokens = segment(
            Flags::default(),
            Mode::Conservative,
            &[Alphabet::Han],
            Token::new("測試abc"),
        );
        assert_eq!(surfaces(&tokens), vec!["測", "試", "abc"]);
    }

    #[test]
    fn test_boundaries_are_inherited() {
        let flags = Flags {
            segment_numbers: true,
            ..Default::default()
        };
        let token = Token::new("a1").with_space(true).with_joined_right(true);
        let tokens = segment(flags, Mode::Conservative, &[], token);
        assert!(tokens[0].preceded_by_space);
        assert!(!tokens[0].joined_right);
        assert!(tokens[1].joined_right);
        assert!(!tokens[1].preceded_by_space);
    }

    #[test]
    fn test_placeholders_untouched() {
        let flags = Flags {
            segment_numbers: true,
            ..Default::default()
        };
        let tokens = segment(flags, Mode::Conservative, &[], Token::placeholder("｟a1｠"));
        assert_eq!(surfaces(&tokens), vec!["｟a1｠"]);
    }
}
