//! Subword encoders applied to each pre-tokenized token.
//!
//! An encoder turns one [`Token`] into one or more tokens. Boundary
//! annotations of the original token are carried over to the outer pieces,
//! and pieces of the same token are marked as subword-joined.

pub mod bpe;
pub mod sentencepiece;

pub use bpe::Bpe;
pub use sentencepiece::SentencePiece;

use joinery_core::{Casing, Result, Token, VocabularyFilter};
use std::fmt;
use std::path::Path;

/// A subword model.
pub trait SubwordEncoder: fmt::Debug + Send + Sync {
    /// Model family, for logs.
    fn name(&self) -> &'static str;

    /// Split one token into subword tokens.
    fn encode(&self, token: &Token) -> Vec<Token>;

    /// Rebuild the text of a word from its pieces, when the model knows how.
    fn decode(&self, _pieces: &[&str]) -> Option<String> {
        None
    }

    /// Restrict the units `encode` may produce.
    fn set_vocabulary(&mut self, vocabulary: VocabularyFilter);

    /// Load a vocabulary file and restrict output to its units.
    fn load_vocabulary(&mut self, path: &Path, threshold: u64) -> Result<()> {
        let vocabulary = VocabularyFilter::load(path, threshold)?;
        tracing::debug!(
            "{} vocabulary: {} units above threshold {}",
            self.name(),
            vocabulary.len(),
            threshold
        );
        self.set_vocabulary(vocabulary);
        Ok(())
    }
}

/// Build subword tokens from plain pieces of `original`.
pub(crate) fn split_token(original: &Token, pieces: Vec<String>) -> Vec<Token> {
    let last = pieces.len().saturating_sub(1);
    let mut out: Vec<Token> = pieces
        .into_iter()
        .enumerate()
        .map(|(idx, piece)| {
            let mut token = Token::new(piece);
            if idx < last {
                token.joined_right = true;
                token.subword_right = true;
            }
            token
        })
        .collect();
    if let Some(first) = out.first_mut() {
        first.preceded_by_space = original.preceded_by_space;
    }
    inherit_boundaries(original, &mut out);
    out
}

/// Copy outer boundaries and casing of `original` onto its pieces.
pub(crate) fn inherit_boundaries(original: &Token, pieces: &mut [Token]) {
    for (idx, piece) in pieces.iter_mut().enumerate() {
        piece.casing = match original.casing {
            Casing::Capitalized if idx > 0 => Casing::Lowercase,
            casing => casing,
        };
        piece.preserve = original.preserve;
    }
    if let Some(first) = pieces.first_mut() {
        first.joined_left = original.joined_left;
        first.segmented_left = original.segmented_left;
    }
    if let Some(last) = pieces.last_mut() {
        last.joined_right = original.joined_right;
        last.subword_right = original.subword_right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_token_boundaries() {
        let mut original = Token::new("lowest").with_space(true).with_joined_right(true);
        original.casing = Casing::Capitalized;
        let pieces = split_token(&original, vec!["low".into(), "est".into()]);

        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].preceded_by_space);
        assert!(pieces[0].joined_right);
        assert!(pieces[0].subword_right);
        assert_eq!(pieces[0].casing, Casing::Capitalized);
        assert!(!pieces[1].preceded_by_space);
        assert!(pieces[1].joined_right);
        assert!(!pieces[1].subword_right);
        assert_eq!(pieces[1].casing, Casing::Lowercase);
    }

    #[test]
    fn test_split_token_single_piece() {
        let original = Token::new("a").with_joined_left(true);
        let pieces = split_token(&original, vec!["a".into()]);
        assert_eq!(pieces, vec![original]);
    }
}
