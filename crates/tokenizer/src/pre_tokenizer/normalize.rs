//! Unicode normalization applied by SentencePiece models.

use unicode_normalization::UnicodeNormalization;

/// Normalization form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationForm {
    NFC,
    NFD,
    /// Compatibility composition, the SentencePiece default
    #[default]
    NFKC,
    NFKD,
    /// Leave text untouched
    None,
}

/// Unicode normalizer with optional case folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalizer {
    form: NormalizationForm,
    case_fold: bool,
}

impl Normalizer {
    pub fn new(form: NormalizationForm) -> Self {
        Self {
            form,
            case_fold: false,
        }
    }

    /// Normalizer for a SentencePiece normalization rule name
    /// (`nmt_nfkc`, `nfkc_cf`, `identity`, ...). Unknown names fall back
    /// to NFKC.
    pub fn for_rule(name: &str) -> Self {
        let case_fold = name.ends_with("_cf");
        let base = name.strip_suffix("_cf").unwrap_or(name);
        let base = base.strip_prefix("nmt_").unwrap_or(base);
        let form = match base {
            "" | "identity" => NormalizationForm::None,
            "nfc" => NormalizationForm::NFC,
            "nfd" => NormalizationForm::NFD,
            "nfkd" => NormalizationForm::NFKD,
            _ => NormalizationForm::NFKC,
        };
        Self { form, case_fold }
    }

    pub fn form(&self) -> NormalizationForm {
        self.form
    }

    /// Normalize text.
    pub fn normalize(&self, text: &str) -> String {
        let normalized: String = match self.form {
            NormalizationForm::NFC => text.nfc().collect(),
            NormalizationForm::NFD => text.nfd().collect(),
            NormalizationForm::NFKC => text.nfkc().collect(),
            NormalizationForm::NFKD => text.nfkd().collect(),
            NormalizationForm::None => text.to_string(),
        };
        if self.case_fold {
            normalized.to_lowercase()
        } else {
            normalized
        }
    }

    /// Whether `normalize` can change its input.
    pub fn is_enabled(&self) -> bool {
        self.form != NormalizationForm::None || self.case_fold
    }
}
