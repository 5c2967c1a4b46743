//! Rendering annotated tokens to strings with joiners, spacers and case
//! markers.

use super::flags::{Flags, Marker};
use crate::pre_tokenizer::CaseMarker;
use joinery_core::markers::SPACER_MARKER;
use joinery_core::{Casing, Token};

/// Boundary between a token and its left neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary<'a> {
    None,
    /// The previous token ends with the joiner.
    Suffix,
    /// This token starts with the marker.
    Prefix(&'a str),
    /// The marker is a token of its own.
    Standalone(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Word,
    Segment,
    Subword,
}

/// Renders tokens for one set of flags.
pub(crate) struct Annotator<'a> {
    flags: &'a Flags,
    joiner: &'a str,
}

impl<'a> Annotator<'a> {
    pub(crate) fn new(flags: &'a Flags, joiner: &'a str) -> Self {
        Self { flags, joiner }
    }

    /// Render tokens to their final strings.
    pub(crate) fn render(&self, tokens: &[Token]) -> Vec<String> {
        let boundaries: Vec<Boundary<'a>> = tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| {
                let prev = idx.checked_sub(1).map(|i| &tokens[i]);
                self.boundary(prev, token)
            })
            .collect();

        let mut out = Vec::with_capacity(tokens.len() + tokens.len() / 2);
        for (idx, token) in tokens.iter().enumerate() {
            if let Boundary::Standalone(marker) = boundaries[idx] {
                out.push(marker.to_string());
            }

            let upper = self.flags.case_markup && token.casing == Casing::Uppercase;
            if self.flags.case_markup {
                let prev_upper = idx > 0 && tokens[idx - 1].casing == Casing::Uppercase;
                if upper && !prev_upper {
                    out.push(CaseMarker::BeginRegion(Casing::Uppercase).render());
                } else if token.casing == Casing::Capitalized {
                    out.push(CaseMarker::Modifier(Casing::Capitalized).render());
                }
            }

            let mut text = String::with_capacity(token.surface.len() + 6);
            if let Boundary::Prefix(marker) = boundaries[idx] {
                text.push_str(marker);
            }
            text.push_str(&token.surface);
            if boundaries.get(idx + 1) == Some(&Boundary::Suffix) {
                text.push_str(self.joiner);
            }
            out.push(text);

            let next_upper = tokens
                .get(idx + 1)
                .is_some_and(|next| next.casing == Casing::Uppercase);
            if upper && !next_upper {
                out.push(CaseMarker::EndRegion(Casing::Uppercase).render());
            }
        }
        out
    }

    fn boundary(&self, prev: Option<&Token>, token: &Token) -> Boundary<'a> {
        let Some(prev) = prev else {
            // A leading spacer marks whitespace before the first token only
            // when subword encoding produced it.
            return self.spacer_boundary(token);
        };
        let marking = self.flags.boundary_marking();

        if !(prev.joined_right || token.joined_left) {
            return self.spacer_boundary(token);
        }

        let kind = if prev.subword_right {
            JoinKind::Subword
        } else if token.segmented_left {
            JoinKind::Segment
        } else {
            JoinKind::Word
        };
        let marker = match kind {
            JoinKind::Subword => marking.subword,
            JoinKind::Word | JoinKind::Segment => marking.word,
        };
        let Marker::Joiner { standalone } = marker else {
            return Boundary::None;
        };

        // The joiner sits on the side that asked for the join.
        let on_prev = prev.joined_right && !token.joined_left;
        let holder = if on_prev { prev } else { token };
        let standalone = standalone
            || holder.preserve
            || (kind == JoinKind::Segment && self.flags.preserve_segmented_tokens);

        if standalone {
            Boundary::Standalone(self.joiner)
        } else if on_prev {
            Boundary::Suffix
        } else {
            Boundary::Prefix(self.joiner)
        }
    }

    fn spacer_boundary(&self, token: &Token) -> Boundary<'a> {
        if !token.preceded_by_space {
            return Boundary::None;
        }
        match self.flags.boundary_marking().word {
            Marker::Spacer { standalone } if standalone || token.preserve => {
                Boundary::Standalone(SPACER_MARKER)
            }
            Marker::Spacer { .. } => Boundary::Prefix(SPACER_MARKER),
            _ => Boundary::None,
        }
    }
}
