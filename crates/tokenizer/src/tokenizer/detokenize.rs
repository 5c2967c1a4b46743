//! Rebuilding text from annotated tokens.
//!
//! Joiners glue tokens together; without them a single space separates
//! tokens. Under the spacer convention it is the other way around: tokens
//! are glued unless a spacer asks for whitespace.

use crate::pre_tokenizer::placeholder::unescape;
use crate::pre_tokenizer::CaseMarker;
use joinery_core::markers::{is_placeholder, SPACER_MARKER};
use joinery_core::Casing;
use serde::{Deserialize, Serialize};

/// Half-open character interval of the detokenized text.
///
/// `token` is the index of the input token that produced the interval, or
/// `None` for a separator inserted between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
    pub token: Option<usize>,
}

impl TextRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub(crate) struct Detokenizer<'a> {
    pub joiner: &'a str,
    pub spacer_convention: bool,
    pub case_markup: bool,
}

#[derive(Default)]
struct State {
    text: String,
    chars: usize,
    ranges: Vec<TextRange>,
    started: bool,
    prev_joins_right: bool,
    pending_join: bool,
    pending_space: bool,
    modifier: Option<Casing>,
    region: Option<Casing>,
}

impl Detokenizer<'_> {
    pub(crate) fn run<S: AsRef<str>>(&self, tokens: &[S]) -> (String, Vec<TextRange>) {
        let mut state = State::default();

        for (idx, raw) in tokens.iter().enumerate() {
            let raw = raw.as_ref();
            if self.case_markup {
                if let Some(marker) = CaseMarker::parse(raw) {
                    match marker {
                        CaseMarker::Modifier(casing) => state.modifier = Some(casing),
                        CaseMarker::BeginRegion(casing) => state.region = Some(casing),
                        CaseMarker::EndRegion(_) => state.region = None,
                    }
                    continue;
                }
            }
            if raw == self.joiner {
                state.pending_join = true;
                continue;
            }
            if raw == SPACER_MARKER {
                state.pending_space = true;
                continue;
            }

            let (body, spaced) = match raw.strip_prefix(SPACER_MARKER) {
                Some(rest) => (rest, true),
                None => (raw, false),
            };
            let (body, join_left) = match body.strip_prefix(self.joiner) {
                Some(rest) => (rest, true),
                None => (body, false),
            };
            let (body, join_right) = match body.strip_suffix(self.joiner) {
                Some(rest) => (rest, true),
                None => (body, false),
            };

            if body.is_empty() {
                state.pending_join |= join_left || join_right;
                state.pending_space |= spaced;
                continue;
            }

            let separate = state.started
                && if self.spacer_convention {
                    spaced || state.pending_space
                } else {
                    !(state.prev_joins_right || join_left || state.pending_join)
                };
            state.pending_join = false;
            state.pending_space = false;

            if separate {
                state.text.push(' ');
                state.ranges.push(TextRange {
                    start: state.chars,
                    end: state.chars + 1,
                    token: None,
                });
                state.chars += 1;
            }

            let surface = if is_placeholder(body) {
                unescape(body).into_owned()
            } else {
                match state.modifier.take().or(state.region) {
                    Some(casing) => casing.restore(body),
                    None => body.to_string(),
                }
            };
            let len = surface.chars().count();
            state.text.push_str(&surface);
            state.ranges.push(TextRange {
                start: state.chars,
                end: state.chars + len,
                token: Some(idx),
            });
            state.chars += len;
            state.started = true;
            state.prev_joins_right = join_right;
        }

        (state.text, state.ranges)
    }
}

/// Fuse adjacent token spans: tokens glued without a separator form one
/// word, attributed to its first token.
pub(crate) fn merge_ranges(ranges: Vec<TextRange>) -> Vec<TextRange> {
    let mut out: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last_mut() {
            Some(last)
                if last.token.is_some() && range.token.is_some() && last.end == range.start =>
            {
                last.end = range.end;
            }
            _ => out.push(range),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joiner_mode() -> Detokenizer<'static> {
        Detokenizer {
            joiner: "￭",
            spacer_convention: false,
            case_markup: true,
        }
    }

    fn spacer_mode() -> Detokenizer<'static> {
        Detokenizer {
            joiner: "￭",
            spacer_convention: true,
            case_markup: false,
        }
    }

    #[test]
    fn test_joiners() {
        let (text, _) = joiner_mode().run(&["Hello", "￭,", "world", "￭!"]);
        assert_eq!(text, "Hello, world!");
        let (text, _) = joiner_mode().run(&["(￭", "a", "￭)", "b"]);
        assert_eq!(text, "(a) b");
        let (text, _) = joiner_mode().run(&["a", "￭", "b", "c"]);
        assert_eq!(text, "ab c");
    }

    #[test]
    fn test_spacers() {
        let (text, _) = spacer_mode().run(&["▁Hel", "lo", "▁world", "!"]);
        assert_eq!(text, "Hello world!");
        let (text, _) = spacer_mode().run(&["a", "▁", "b", "c"]);
        assert_eq!(text, "a bc");
    }

    #[test]
    fn test_case_restoration() {
        let (text, _) = joiner_mode().run(&[
            "｟mrk_case_modifier_C｠",
            "hello",
            "｟mrk_begin_case_region_U｠",
            "wor￭",
            "ld",
            "｟mrk_end_case_region_U｠",
            "￭!",
        ]);
        assert_eq!(text, "Hello WORLD!");
    }

    #[test]
    fn test_placeholder_unescaped() {
        let (text, _) = joiner_mode().run(&["a", "｟b％0020c｠"]);
        assert_eq!(text, "a ｟b c｠");
    }

    #[test]
    fn test_unclosed_placeholder_unescaped() {
        let (text, _) = joiner_mode().run(&["a", "｟open％0020end"]);
        assert_eq!(text, "a ｟open end");
    }

    #[test]
    fn test_ranges_in_characters() {
        let (text, ranges) = joiner_mode().run(&["héllo", "￭,", "wörld"]);
        assert_eq!(text, "héllo, wörld");
        assert_eq!(
            ranges,
            vec![
                TextRange { start: 0, end: 5, token: Some(0) },
                TextRange { start: 5, end: 6, token: Some(1) },
                TextRange { start: 6, end: 7, token: None },
                TextRange { start: 7, end: 12, token: Some(2) },
            ]
        );
        let merged = merge_ranges(ranges);
        assert_eq!(merged[0], TextRange { start: 0, end: 6, token: Some(0) });
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_markers_produce_no_range() {
        let (_, ranges) = joiner_mode().run(&["a", "￭", "b"]);
        let tokens: Vec<_> = ranges.iter().map(|r| r.token).collect();
        assert_eq!(tokens, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_empty() {
        let (text, ranges) = joiner_mode().run::<&str>(&[]);
        assert!(text.is_empty());
        assert!(ranges.is_empty());
    }
}
