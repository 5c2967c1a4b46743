//! Character classification by writing system.
//!
//! Segmentation rules need to know which script a letter belongs to. The
//! lookup is a sorted table of code point ranges searched with a binary
//! search; letters outside every known range fall back to
//! [`Alphabet::Other`].

use crate::error::{Result, TokenizerError};
use crate::markers::{PH_MARKER_CLOSE, PH_MARKER_OPEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A writing system known to the segmentation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Alphabet {
    Latin,
    Greek,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Syriac,
    Thaana,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Thai,
    Lao,
    Tibetan,
    Myanmar,
    Georgian,
    Hangul,
    Ethiopic,
    Cherokee,
    Khmer,
    Mongolian,
    Hiragana,
    Katakana,
    Bopomofo,
    Han,
    /// Letters of a script missing from the range table.
    Other,
}

const ALL_ALPHABETS: &[Alphabet] = &[
    Alphabet::Latin,
    Alphabet::Greek,
    Alphabet::Cyrillic,
    Alphabet::Armenian,
    Alphabet::Hebrew,
    Alphabet::Arabic,
    Alphabet::Syriac,
    Alphabet::Thaana,
    Alphabet::Devanagari,
    Alphabet::Bengali,
    Alphabet::Gurmukhi,
    Alphabet::Gujarati,
    Alphabet::Oriya,
    Alphabet::Tamil,
    Alphabet::Telugu,
    Alphabet::Kannada,
    Alphabet::Malayalam,
    Alphabet::Sinhala,
    Alphabet::Thai,
    Alphabet::Lao,
    Alphabet::Tibetan,
    Alphabet::Myanmar,
    Alphabet::Georgian,
    Alphabet::Hangul,
    Alphabet::Ethiopic,
    Alphabet::Cherokee,
    Alphabet::Khmer,
    Alphabet::Mongolian,
    Alphabet::Hiragana,
    Alphabet::Katakana,
    Alphabet::Bopomofo,
    Alphabet::Han,
    Alphabet::Other,
];

/// Inclusive code point ranges, sorted and non-overlapping.
const RANGES: &[(u32, u32, Alphabet)] = &[
    (0x0041, 0x005A, Alphabet::Latin),
    (0x0061, 0x007A, Alphabet::Latin),
    (0x00AA, 0x00AA, Alphabet::Latin),
    (0x00BA, 0x00BA, Alphabet::Latin),
    (0x00C0, 0x02AF, Alphabet::Latin),
    (0x0370, 0x03FF, Alphabet::Greek),
    (0x0400, 0x052F, Alphabet::Cyrillic),
    (0x0530, 0x058F, Alphabet::Armenian),
    (0x0590, 0x05FF, Alphabet::Hebrew),
    (0x0600, 0x06FF, Alphabet::Arabic),
    (0x0700, 0x074F, Alphabet::Syriac),
    (0x0750, 0x077F, Alphabet::Arabic),
    (0x0780, 0x07BF, Alphabet::Thaana),
    (0x08A0, 0x08FF, Alphabet::Arabic),
    (0x0900, 0x097F, Alphabet::Devanagari),
    (0x0980, 0x09FF, Alphabet::Bengali),
    (0x0A00, 0x0A7F, Alphabet::Gurmukhi),
    (0x0A80, 0x0AFF, Alphabet::Gujarati),
    (0x0B00, 0x0B7F, Alphabet::Oriya),
    (0x0B80, 0x0BFF, Alphabet::Tamil),
    (0x0C00, 0x0C7F, Alphabet::Telugu),
    (0x0C80, 0x0CFF, Alphabet::Kannada),
    (0x0D00, 0x0D7F, Alphabet::Malayalam),
    (0x0D80, 0x0DFF, Alphabet::Sinhala),
    (0x0E00, 0x0E7F, Alphabet::Thai),
    (0x0E80, 0x0EFF, Alphabet::Lao),
    (0x0F00, 0x0FFF, Alphabet::Tibetan),
    (0x1000, 0x109F, Alphabet::Myanmar),
    (0x10A0, 0x10FF, Alphabet::Georgian),
    (0x1100, 0x11FF, Alphabet::Hangul),
    (0x1200, 0x139F, Alphabet::Ethiopic),
    (0x13A0, 0x13FF, Alphabet::Cherokee),
    (0x1780, 0x17FF, Alphabet::Khmer),
    (0x1800, 0x18AF, Alphabet::Mongolian),
    (0x19E0, 0x19FF, Alphabet::Khmer),
    (0x1C80, 0x1C8F, Alphabet::Cyrillic),
    (0x1D00, 0x1DBF, Alphabet::Latin),
    (0x1E00, 0x1EFF, Alphabet::Latin),
    (0x1F00, 0x1FFF, Alphabet::Greek),
    (0x2C60, 0x2C7F, Alphabet::Latin),
    (0x2D00, 0x2D2F, Alphabet::Georgian),
    (0x2D80, 0x2DDF, Alphabet::Ethiopic),
    (0x2DE0, 0x2DFF, Alphabet::Cyrillic),
    (0x2E80, 0x2FDF, Alphabet::Han),
    (0x3005, 0x3007, Alphabet::Han),
    (0x3021, 0x3029, Alphabet::Han),
    (0x3038, 0x303B, Alphabet::Han),
    (0x3040, 0x309F, Alphabet::Hiragana),
    (0x30A0, 0x30FF, Alphabet::Katakana),
    (0x3100, 0x312F, Alphabet::Bopomofo),
    (0x3130, 0x318F, Alphabet::Hangul),
    (0x31A0, 0x31BF, Alphabet::Bopomofo),
    (0x31F0, 0x31FF, Alphabet::Katakana),
    (0x3400, 0x4DBF, Alphabet::Han),
    (0x4E00, 0x9FFF, Alphabet::Han),
    (0xA640, 0xA69F, Alphabet::Cyrillic),
    (0xA720, 0xA7FF, Alphabet::Latin),
    (0xA8E0, 0xA8FF, Alphabet::Devanagari),
    (0xA960, 0xA97F, Alphabet::Hangul),
    (0xAB30, 0xAB6F, Alphabet::Latin),
    (0xAC00, 0xD7FF, Alphabet::Hangul),
    (0xF900, 0xFAFF, Alphabet::Han),
    (0xFB00, 0xFB06, Alphabet::Latin),
    (0xFB13, 0xFB17, Alphabet::Armenian),
    (0xFB1D, 0xFB4F, Alphabet::Hebrew),
    (0xFB50, 0xFDFF, Alphabet::Arabic),
    (0xFE70, 0xFEFF, Alphabet::Arabic),
    (0xFF21, 0xFF3A, Alphabet::Latin),
    (0xFF41, 0xFF5A, Alphabet::Latin),
    (0xFF66, 0xFF9F, Alphabet::Katakana),
    (0xFFA0, 0xFFDC, Alphabet::Hangul),
    (0x20000, 0x2FA1F, Alphabet::Han),
    (0x30000, 0x3134F, Alphabet::Han),
];

impl Alphabet {
    /// Canonical name, as accepted by [`Alphabet::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            Alphabet::Latin => "Latin",
            Alphabet::Greek => "Greek",
            Alphabet::Cyrillic => "Cyrillic",
            Alphabet::Armenian => "Armenian",
            Alphabet::Hebrew => "Hebrew",
            Alphabet::Arabic => "Arabic",
            Alphabet::Syriac => "Syriac",
            Alphabet::Thaana => "Thaana",
            Alphabet::Devanagari => "Devanagari",
            Alphabet::Bengali => "Bengali",
            Alphabet::Gurmukhi => "Gurmukhi",
            Alphabet::Gujarati => "Gujarati",
            Alphabet::Oriya => "Oriya",
            Alphabet::Tamil => "Tamil",
            Alphabet::Telugu => "Telugu",
            Alphabet::Kannada => "Kannada",
            Alphabet::Malayalam => "Malayalam",
            Alphabet::Sinhala => "Sinhala",
            Alphabet::Thai => "Thai",
            Alphabet::Lao => "Lao",
            Alphabet::Tibetan => "Tibetan",
            Alphabet::Myanmar => "Myanmar",
            Alphabet::Georgian => "Georgian",
            Alphabet::Hangul => "Hangul",
            Alphabet::Ethiopic => "Ethiopic",
            Alphabet::Cherokee => "Cherokee",
            Alphabet::Khmer => "Khmer",
            Alphabet::Mongolian => "Mongolian",
            Alphabet::Hiragana => "Hiragana",
            Alphabet::Katakana => "Katakana",
            Alphabet::Bopomofo => "Bopomofo",
            Alphabet::Han => "Han",
            Alphabet::Other => "Other",
        }
    }

    /// All known alphabets, in declaration order.
    pub fn all() -> &'static [Alphabet] {
        ALL_ALPHABETS
    }

    /// Alphabet of a letter, looked up in the range table.
    ///
    /// Callers are expected to pass letters; for other characters the result
    /// only reflects which block the code point lives in.
    pub fn of(c: char) -> Alphabet {
        let cp = c as u32;
        RANGES
            .binary_search_by(|&(start, end, _)| {
                if end < cp {
                    std::cmp::Ordering::Less
                } else if start > cp {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .map(|idx| RANGES[idx].2)
            .unwrap_or(Alphabet::Other)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_ALPHABETS
            .iter()
            .copied()
            .find(|alphabet| alphabet.name() == s)
            .ok_or_else(|| TokenizerError::InvalidConfig(format!("unknown alphabet: {}", s)))
    }
}

/// Coarse category of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// A letter of the given alphabet.
    Letter(Alphabet),
    /// A numeric character.
    Digit,
    /// Whitespace.
    Separator,
    /// A placeholder delimiter (`｟` or `｠`).
    Placeholder,
    /// Punctuation, symbols and everything else.
    Other,
}

impl CharClass {
    /// Classify a single character.
    pub fn of(c: char) -> CharClass {
        if c == PH_MARKER_OPEN || c == PH_MARKER_CLOSE {
            CharClass::Placeholder
        } else if c.is_whitespace() {
            CharClass::Separator
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            CharClass::Letter(Alphabet::of(c))
        } else {
            CharClass::Other
        }
    }

    /// Letters and digits.
    #[inline]
    pub fn is_alphanumeric(self) -> bool {
        matches!(self, CharClass::Letter(_) | CharClass::Digit)
    }

    #[inline]
    pub fn is_letter(self) -> bool {
        matches!(self, CharClass::Letter(_))
    }

    /// The alphabet of a letter, `None` for any other class.
    #[inline]
    pub fn alphabet(self) -> Option<Alphabet> {
        match self {
            CharClass::Letter(alphabet) => Some(alphabet),
            _ => None,
        }
    }
}
