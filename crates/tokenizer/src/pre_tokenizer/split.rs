//! Mode-driven splitting of raw text into tokens.
//!
//! Text is first cut into chunks at whitespace; placeholders are atomic and
//! may contain whitespace. Each chunk is then split into pieces according to
//! the [`Mode`], and pieces of the same chunk are marked as joined.

use super::placeholder::{escape_whitespace, substitute_outside_placeholders};
use crate::tokenizer::Mode;
use joinery_core::markers::{substitute_markers, PH_MARKER_CLOSE, PH_MARKER_OPEN};
use joinery_core::{CharClass, Token};
use unicode_segmentation::UnicodeSegmentation;

enum Unit<'a> {
    Grapheme(&'a str),
    Placeholder(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceKind {
    Word,
    Number,
    Punct,
    Placeholder,
}

struct Piece {
    text: String,
    kind: PieceKind,
}

/// Splits text into raw tokens for one mode.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    mode: Mode,
    substitute: bool,
}

impl Splitter {
    /// Create a splitter; `substitute` replaces reserved markers in the text.
    pub fn new(mode: Mode, substitute: bool) -> Self {
        Self { mode, substitute }
    }

    /// Split text into raw tokens.
    pub fn split(&self, text: &str) -> Vec<Token> {
        if self.mode == Mode::None {
            if text.is_empty() {
                return Vec::new();
            }
            let surface = if self.substitute {
                substitute_outside_placeholders(text)
            } else {
                text.to_string()
            };
            return vec![Token::new(surface)];
        }

        let mut tokens: Vec<Token> = Vec::new();
        for (chunk_idx, units) in chunks(text).into_iter().enumerate() {
            let pieces = match self.mode {
                Mode::Space => self.split_space(units),
                Mode::Char => self.split_char(units),
                Mode::Aggressive => self.split_aggressive(units),
                Mode::Conservative | Mode::None => self.split_conservative(units),
            };

            let mut prev_kind = None;
            for (piece_idx, piece) in pieces.into_iter().enumerate() {
                let mut token = match piece.kind {
                    PieceKind::Placeholder => Token::placeholder(piece.text),
                    _ => Token::new(piece.text),
                };
                if piece_idx == 0 {
                    token.preceded_by_space = chunk_idx > 0;
                } else if prev_kind == Some(PieceKind::Punct) && piece.kind != PieceKind::Punct {
                    if let Some(prev) = tokens.last_mut() {
                        prev.joined_right = true;
                    }
                } else {
                    token.joined_left = true;
                }
                prev_kind = Some(piece.kind);
                tokens.push(token);
            }
        }
        tokens
    }

    fn surface(&self, grapheme: &str) -> String {
        if self.substitute {
            substitute_markers(grapheme)
        } else {
            grapheme.to_string()
        }
    }

    fn split_space(&self, units: Vec<Unit<'_>>) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for unit in units {
            match unit {
                Unit::Grapheme(g) => current.push_str(&self.surface(g)),
                Unit::Placeholder(ph) => {
                    flush(&mut pieces, &mut current, PieceKind::Word);
                    pieces.push(Piece {
                        text: ph,
                        kind: PieceKind::Placeholder,
                    });
                }
            }
        }
        flush(&mut pieces, &mut current, PieceKind::Word);
        pieces
    }

    fn split_char(&self, units: Vec<Unit<'_>>) -> Vec<Piece> {
        units
            .into_iter()
            .map(|unit| match unit {
                Unit::Grapheme(g) => Piece {
                    text: self.surface(g),
                    kind: match classify(g) {
                        CharClass::Letter(_) => PieceKind::Word,
                        CharClass::Digit => PieceKind::Number,
                        _ => PieceKind::Punct,
                    },
                },
                Unit::Placeholder(ph) => Piece {
                    text: ph,
                    kind: PieceKind::Placeholder,
                },
            })
            .collect()
    }

    fn split_aggressive(&self, units: Vec<Unit<'_>>) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_kind = PieceKind::Word;

        for unit in units {
            let g = match unit {
                Unit::Grapheme(g) => g,
                Unit::Placeholder(ph) => {
                    flush(&mut pieces, &mut current, current_kind);
                    pieces.push(Piece {
                        text: ph,
                        kind: PieceKind::Placeholder,
                    });
                    continue;
                }
            };
            let kind = match classify(g) {
                CharClass::Letter(_) => PieceKind::Word,
                CharClass::Digit => PieceKind::Number,
                _ => PieceKind::Punct,
            };
            if kind == PieceKind::Punct {
                flush(&mut pieces, &mut current, current_kind);
                pieces.push(Piece {
                    text: self.surface(g),
                    kind,
                });
                continue;
            }
            if kind != current_kind {
                flush(&mut pieces, &mut current, current_kind);
                current_kind = kind;
            }
            current.push_str(&self.surface(g));
        }
        flush(&mut pieces, &mut current, current_kind);
        pieces
    }

    fn split_conservative(&self, units: Vec<Unit<'_>>) -> Vec<Piece> {
        let classes: Vec<Option<CharClass>> = units
            .iter()
            .map(|unit| match unit {
                Unit::Grapheme(g) => Some(classify(g)),
                Unit::Placeholder(_) => None,
            })
            .collect();

        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_kind = PieceKind::Word;

        for (idx, unit) in units.into_iter().enumerate() {
            let g = match unit {
                Unit::Grapheme(g) => g,
                Unit::Placeholder(ph) => {
                    flush(&mut pieces, &mut current, current_kind);
                    pieces.push(Piece {
                        text: ph,
                        kind: PieceKind::Placeholder,
                    });
                    continue;
                }
            };
            let class = classes[idx].unwrap_or(CharClass::Other);

            if class.is_alphanumeric() {
                if current_kind != PieceKind::Word {
                    flush(&mut pieces, &mut current, current_kind);
                    current_kind = PieceKind::Word;
                }
                current.push_str(&self.surface(g));
                continue;
            }

            let in_word = current_kind == PieceKind::Word && !current.is_empty();
            let prev = idx.checked_sub(1).and_then(|i| classes[i]);
            let next = classes.get(idx + 1).copied().flatten();
            if in_word && is_connector(g, prev, next) {
                current.push_str(&self.surface(g));
            } else if current_kind == PieceKind::Punct && !current.is_empty() {
                current.push_str(&self.surface(g));
            } else {
                flush(&mut pieces, &mut current, current_kind);
                current_kind = PieceKind::Punct;
                current.push_str(&self.surface(g));
            }
        }
        flush(&mut pieces, &mut current, current_kind);
        pieces
    }
}

fn flush(pieces: &mut Vec<Piece>, current: &mut String, kind: PieceKind) {
    if !current.is_empty() {
        pieces.push(Piece {
            text: std::mem::take(current),
            kind,
        });
    }
}

/// Class of a grapheme cluster, from its first character.
fn classify(grapheme: &str) -> CharClass {
    grapheme
        .chars()
        .next()
        .map_or(CharClass::Other, CharClass::of)
}

/// Punctuation kept inside a word in conservative mode.
fn is_connector(grapheme: &str, prev: Option<CharClass>, next: Option<CharClass>) -> bool {
    let alnum = |class: Option<CharClass>| class.is_some_and(CharClass::is_alphanumeric);
    let digit = |class: Option<CharClass>| class == Some(CharClass::Digit);
    match grapheme {
        "-" => prev.is_some_and(CharClass::is_letter) && alnum(next),
        "_" => alnum(prev) && alnum(next),
        "." | "," => digit(prev) && digit(next),
        _ => false,
    }
}

/// Cut text into whitespace-free chunks of graphemes and placeholders.
fn chunks(text: &str) -> Vec<Vec<Unit<'_>>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut placeholder: Option<String> = None;

    for g in text.graphemes(true) {
        if let Some(ph) = placeholder.as_mut() {
            escape_whitespace(g, ph);
            if g.starts_with(PH_MARKER_CLOSE) {
                current.push(Unit::Placeholder(std::mem::take(ph)));
                placeholder = None;
            }
            continue;
        }
        if g.starts_with(char::is_whitespace) {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
        } else if g.starts_with(PH_MARKER_OPEN) {
            placeholder = Some(g.to_string());
        } else {
            current.push(Unit::Grapheme(g));
        }
    }

    // An unclosed placeholder runs to the end of the text.
    if let Some(ph) = placeholder {
        current.push(Unit::Placeholder(ph));
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
