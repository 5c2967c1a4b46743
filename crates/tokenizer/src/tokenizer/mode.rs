//! Tokenization modes.

use joinery_core::{Result, TokenizerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy for the initial split of the input into raw tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Words keep inner hyphens, underscores and digit separators;
    /// punctuation runs are grouped.
    #[default]
    Conservative,
    /// Every punctuation character is isolated and letters split from digits.
    Aggressive,
    /// Whitespace only.
    Space,
    /// One token per grapheme cluster.
    Char,
    /// The whole input is one token.
    None,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Conservative => "conservative",
            Mode::Aggressive => "aggressive",
            Mode::Space => "space",
            Mode::Char => "char",
            Mode::None => "none",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "conservative" => Ok(Mode::Conservative),
            "aggressive" => Ok(Mode::Aggressive),
            "space" => Ok(Mode::Space),
            "char" => Ok(Mode::Char),
            "none" => Ok(Mode::None),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown mode: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = TokenizerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("aggressive".parse::<Mode>().unwrap(), Mode::Aggressive);
        assert_eq!("none".parse::<Mode>().unwrap(), Mode::None);
        assert!(matches!(
            "Aggressive".parse::<Mode>(),
            Err(TokenizerError::InvalidConfig(_))
        ));
        assert!("fancy".parse::<Mode>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Mode::Char).unwrap();
        assert_eq!(json, "\"char\"");
        let mode: Mode = serde_json::from_str("\"space\"").unwrap();
        assert_eq!(mode, Mode::Space);
        assert!(serde_json::from_str::<Mode>("\"sentencepiece\"").is_err());
    }
}
