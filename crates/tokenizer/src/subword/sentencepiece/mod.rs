//! SentencePiece models.
//!
//! Models are read from the binary protobuf file written by `spm_train`.
//! Unigram models pick the highest-scoring segmentation, or sample one of
//! the n best when subword regularization is enabled; BPE models merge the
//! best-scoring adjacent pair until none is left.

mod lattice;
pub mod proto;

use super::{inherit_boundaries, SubwordEncoder};
use crate::io::read_model_bytes;
use crate::pre_tokenizer::Normalizer;
use ahash::AHashMap;
use joinery_core::markers::{SPACER_CHAR, SPACER_MARKER};
use joinery_core::{Result, Token, TokenizerError, VocabularyFilter};
use prost::Message;
use proto::{ModelProto, NormalizerSpec, PieceProto};
use rand::distributions::{Distribution, WeightedIndex};
use std::path::Path;

pub use proto::{ModelType, PieceType};

/// Score penalty of unknown characters relative to the worst piece.
const UNKNOWN_PENALTY: f32 = 10.0;

/// SentencePiece subword encoder.
#[derive(Debug, Clone)]
pub struct SentencePiece {
    pieces: Vec<PieceProto>,
    index: AHashMap<String, usize>,
    model_type: ModelType,
    normalizer: Normalizer,
    spec: NormalizerSpec,
    max_piece_chars: usize,
    unknown_score: f32,
    nbest_size: usize,
    alpha: f32,
    vocabulary: Option<VocabularyFilter>,
}

impl SentencePiece {
    /// Decode a model from its serialized bytes. `origin` is used in errors.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self> {
        let model = ModelProto::decode(bytes)
            .map_err(|e| TokenizerError::model_load(origin, e.to_string()))?;
        if model.pieces.is_empty() {
            return Err(TokenizerError::model_load(origin, "model has no pieces"));
        }
        let model_type = model.model_type();
        let spec = model.normalizer_spec.unwrap_or_default();

        let mut index = AHashMap::with_capacity(model.pieces.len());
        let mut max_piece_chars = 1;
        let mut min_score = 0.0f32;
        for (id, piece) in model.pieces.iter().enumerate() {
            index.entry(piece.piece().to_string()).or_insert(id);
            if piece.kind().is_encodable() {
                max_piece_chars = max_piece_chars.max(piece.piece().chars().count());
                min_score = min_score.min(piece.score());
            }
        }

        Ok(Self {
            normalizer: Normalizer::for_rule(spec.rule()),
            index,
            model_type,
            spec,
            pieces: model.pieces,
            max_piece_chars,
            unknown_score: min_score - UNKNOWN_PENALTY,
            nbest_size: 0,
            alpha: 0.0,
            vocabulary: None,
        })
    }

    /// Load a model file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_model_bytes(path)?;
        let model = Self::from_bytes(&bytes, path)?;
        tracing::info!(
            "Loaded SentencePiece {:?} model with {} pieces from {}",
            model.model_type,
            model.pieces.len(),
            path.display()
        );
        Ok(model)
    }

    /// Sample among the `nbest_size` best segmentations, weighted by
    /// `exp(alpha * score)`. A zero `nbest_size` keeps the best one.
    pub fn with_sampling(mut self, nbest_size: usize, alpha: f32) -> Self {
        self.nbest_size = nbest_size;
        self.alpha = alpha;
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Number of pieces in the model.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Apply the model's normalization and whitespace handling.
    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = self.normalizer.normalize(text);
        if self.spec.remove_extra_whitespaces() {
            normalized = normalized
                .split(' ')
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
        }
        if normalized.is_empty() {
            return normalized;
        }
        let space = if self.spec.escape_whitespaces() {
            normalized = normalized.replace(' ', SPACER_MARKER);
            SPACER_MARKER
        } else {
            " "
        };
        if self.spec.add_dummy_prefix() {
            normalized.insert_str(0, space);
        }
        normalized
    }

    /// Segment text into pieces, spacer markers included.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }
        match self.model_type {
            ModelType::Unigram => self.segment_unigram(&normalized),
            ModelType::Bpe => self.segment_bpe(&normalized),
            ModelType::Char => normalized.chars().map(String::from).collect(),
            ModelType::Word => split_words(&normalized),
        }
    }

    fn score(&self, piece: &str) -> Option<f32> {
        let entry = &self.pieces[*self.index.get(piece)?];
        if !entry.kind().is_encodable() {
            return None;
        }
        if let Some(vocabulary) = &self.vocabulary {
            if piece.chars().nth(1).is_some() && !vocabulary.contains(piece) {
                return None;
            }
        }
        Some(entry.score())
    }

    fn segment_unigram(&self, normalized: &str) -> Vec<String> {
        let offsets: Vec<usize> = normalized
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(normalized.len()))
            .collect();
        let sampling = self.nbest_size > 0 && self.alpha > 0.0;
        let k = if sampling { self.nbest_size } else { 1 };

        let paths = lattice::nbest(offsets.len() - 1, self.max_piece_chars, k, |start, end| {
            let piece = &normalized[offsets[start]..offsets[end]];
            self.score(piece)
                .or_else(|| (end - start == 1).then_some(self.unknown_score))
        });

        let chosen = if sampling {
            sample(&paths, self.alpha)
        } else {
            paths.first()
        };
        chosen
            .map(|path| {
                path.spans
                    .iter()
                    .map(|&(start, end)| normalized[offsets[start]..offsets[end]].to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn segment_bpe(&self, normalized: &str) -> Vec<String> {
        let mut symbols: Vec<String> = normalized.chars().map(String::from).collect();
        loop {
            let mut best: Option<(f32, usize)> = None;
            for (idx, pair) in symbols.windows(2).enumerate() {
                let merged = format!("{}{}", pair[0], pair[1]);
                if let Some(score) = self.score(&merged) {
                    if best.map_or(true, |(best_score, _)| score > best_score) {
                        best = Some((score, idx));
                    }
                }
            }
            let Some((_, idx)) = best else {
                break;
            };
            let right = symbols.remove(idx + 1);
            symbols[idx].push_str(&right);
        }
        symbols
    }
}

/// Pick one path with probability proportional to `exp(alpha * score)`.
fn sample(paths: &[lattice::Path], alpha: f32) -> Option<&lattice::Path> {
    let top = paths.first()?.score;
    let weights: Vec<f64> = paths
        .iter()
        .map(|p| f64::from(alpha * (p.score - top)).exp())
        .collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => paths.get(dist.sample(&mut rand::thread_rng())),
        Err(_) => paths.first(),
    }
}

/// Word model: one piece per spacer-delimited word.
fn split_words(normalized: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in normalized.chars() {
        if c == SPACER_CHAR && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert pieces to tokens: a leading spacer means whitespace before the
/// piece, anything else continues the previous piece.
fn pieces_to_tokens(original: &Token, pieces: Vec<String>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(pieces.len());
    let mut pending_space = false;
    for piece in pieces {
        if piece == SPACER_MARKER {
            pending_space = true;
            continue;
        }
        let (spaced, text) = match piece.strip_prefix(SPACER_CHAR) {
            Some(rest) => (true, rest.to_string()),
            None => (pending_space, piece),
        };
        pending_space = false;
        if !spaced {
            if let Some(prev) = out.last_mut() {
                prev.joined_right = true;
                prev.subword_right = true;
            }
        }
        out.push(Token::new(text).with_space(spaced));
    }
    inherit_boundaries(original, &mut out);
    out
}

impl SubwordEncoder for SentencePiece {
    fn name(&self) -> &'static str {
        "sentencepiece"
    }

    fn encode(&self, token: &Token) -> Vec<Token> {
        if token.is_empty() {
            return Vec::new();
        }
        pieces_to_tokens(token, self.segment(&token.surface))
    }

    fn decode(&self, pieces: &[&str]) -> Option<String> {
        let text = pieces.concat().replace(SPACER_MARKER, " ");
        if self.spec.add_dummy_prefix() {
            Some(text.strip_prefix(' ').unwrap_or(&text).to_string())
        } else {
            Some(text)
        }
    }

    fn set_vocabulary(&mut self, vocabulary: VocabularyFilter) {
        self.vocabulary = Some(vocabulary);
    }
}

#[cfg(test)]
mod tests {
    use super::proto::encode;
    use super::*;

    fn model(model_type: ModelType, pieces: &[(&str, f32)]) -> SentencePiece {
        SentencePiece::from_bytes(&encode::simple(model_type, pieces), Path::new("<test>")).unwrap()
    }

    fn unigram() -> SentencePiece {
        model(
            ModelType::Unigram,
            &[
                ("▁", -2.0),
                ("▁hello", -3.0),
                ("▁he", -4.0),
                ("llo", -4.0),
                ("▁world", -3.5),
                ("h", -5.0),
                ("e", -5.0),
                ("l", -5.0),
                ("o", -5.0),
                ("w", -5.0),
                ("r", -5.0),
                ("d", -5.0),
            ],
        )
    }

    #[test]
    fn test_normalize() {
        let sp = unigram();
        assert_eq!(sp.normalize("  Ｈｉ   there "), "▁Hi▁there");
        assert_eq!(sp.normalize("   "), "");
    }

    #[test]
    fn test_unigram_best_path() {
        let sp = unigram();
        assert_eq!(sp.segment("hello world"), vec!["▁hello", "▁world"]);
        assert_eq!(sp.segment("hellod"), vec!["▁hello", "d"]);
    }

    #[test]
    fn test_unknown_characters_kept() {
        let sp = unigram();
        assert_eq!(sp.segment("hé"), vec!["▁", "h", "é"]);
    }

    #[test]
    fn test_sampling_stays_a_segmentation() {
        let sp = unigram().with_sampling(4, 0.5);
        for _ in 0..20 {
            let pieces = sp.segment("hello");
            assert_eq!(pieces.concat(), "▁hello");
        }
    }

    #[test]
    fn test_bpe_model() {
        let sp = model(
            ModelType::Bpe,
            &[("▁", -1.0), ("a", -1.0), ("b", -1.0), ("ab", -2.0), ("▁ab", -3.0)],
        );
        assert_eq!(sp.segment("ab ab"), vec!["▁ab", "▁ab"]);
    }

    #[test]
    fn test_char_and_word_models() {
        let sp = model(ModelType::Char, &[("a", -1.0)]);
        assert_eq!(sp.segment("ab"), vec!["▁", "a", "b"]);
        let sp = model(ModelType::Word, &[("▁ab", -1.0)]);
        assert_eq!(sp.segment("ab cd"), vec!["▁ab", "▁cd"]);
    }

    #[test]
    fn test_vocabulary_restricts_pieces() {
        let mut sp = unigram();
        sp.set_vocabulary(VocabularyFilter::from_entries([("▁he", 1), ("llo", 1)], 0));
        assert_eq!(sp.segment("hello"), vec!["▁he", "llo"]);
    }

    #[test]
    fn test_encode_tokens() {
        let sp = unigram();
        let tokens = sp.encode(&Token::new("hello world"));
        let surfaces: Vec<_> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["hello", "world"]);
        assert!(tokens[0].preceded_by_space);
        assert!(tokens[1].preceded_by_space);
        assert!(!tokens[0].joined_right);

        let tokens = sp.encode(&Token::new("hellod"));
        assert!(tokens[0].joined_right);
        assert!(tokens[0].subword_right);
        assert!(!tokens[1].preceded_by_space);
    }

    #[test]
    fn test_standalone_spacer_piece() {
        let tokens = pieces_to_tokens(
            &Token::new("x"),
            vec!["a".into(), "▁".into(), "b".into()],
        );
        assert_eq!(tokens.len(), 2);
        assert!(!tokens[0].joined_right);
        assert!(tokens[1].preceded_by_space);
    }

    #[test]
    fn test_decode() {
        let sp = unigram();
        assert_eq!(
            sp.decode(&["▁he", "llo", "▁world"]).as_deref(),
            Some("hello world")
        );
    }

    #[test]
    fn test_bad_model_bytes() {
        let err = SentencePiece::from_bytes(b"not a model", Path::new("m.model")).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelLoad { .. }));
        let err = SentencePiece::from_bytes(&[], Path::new("m.model")).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelLoad { .. }));
    }
}
