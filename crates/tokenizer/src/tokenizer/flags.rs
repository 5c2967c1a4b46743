//! Annotation and segmentation flags.
//!
//! Flags are independent booleans. Which marker ends up on which boundary is
//! decided in one place, [`Flags::boundary_marking`], so that combinations of
//! joiner and spacer flags resolve the same way everywhere.

use serde::{Deserialize, Serialize};

/// Independent tokenization flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    /// Attach the joiner to the piece on the punctuation side of a join.
    pub joiner_annotate: bool,
    /// Emit the joiner as a standalone token.
    pub joiner_new: bool,
    /// Prefix tokens that followed whitespace with the spacer.
    pub spacer_annotate: bool,
    /// Emit the spacer as a standalone token.
    pub spacer_new: bool,
    /// Lowercase tokens and record their casing with marker tokens.
    pub case_markup: bool,
    /// Keep reserved markers found in the input instead of substituting them.
    pub no_substitution: bool,
    /// Never attach markers to placeholders.
    pub preserve_placeholders: bool,
    /// Never attach markers across segmentation splits.
    pub preserve_segmented_tokens: bool,
    pub segment_case: bool,
    pub segment_numbers: bool,
    pub segment_alphabet_change: bool,
}

/// Marker used on one kind of boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    None,
    Joiner { standalone: bool },
    Spacer { standalone: bool },
}

/// Resolved marking convention per boundary kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryMarking {
    /// Boundaries between words and raw or segmented pieces.
    pub word: Marker,
    /// Boundaries introduced by subword encoding.
    pub subword: Marker,
}

impl BoundaryMarking {
    /// Whether detokenization should follow the spacer convention.
    #[inline]
    pub fn uses_spacers(&self) -> bool {
        matches!(self.word, Marker::Spacer { .. })
    }
}

impl Flags {
    /// Resolve joiner/spacer flags into the marker used on each boundary kind.
    ///
    /// With both a joiner and a spacer flag, word boundaries use spacers and
    /// subword boundaries use joiners.
    pub fn boundary_marking(&self) -> BoundaryMarking {
        let joiner = Marker::Joiner {
            standalone: self.joiner_new,
        };
        let spacer = Marker::Spacer {
            standalone: self.spacer_new,
        };
        let joins = self.joiner_annotate || self.joiner_new;
        let spaces = self.spacer_annotate || self.spacer_new;

        match (joins, spaces) {
            (true, true) => BoundaryMarking {
                word: spacer,
                subword: joiner,
            },
            (true, false) => BoundaryMarking {
                word: joiner,
                subword: joiner,
            },
            (false, true) => BoundaryMarking {
                word: spacer,
                subword: spacer,
            },
            (false, false) => BoundaryMarking {
                word: Marker::None,
                subword: Marker::None,
            },
        }
    }

    /// Case transitions split tokens (`segment_case`, implied by `case_markup`).
    #[inline]
    pub fn splits_case(&self) -> bool {
        self.segment_case || self.case_markup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_marking_by_default() {
        let marking = Flags::default().boundary_marking();
        assert_eq!(marking.word, Marker::None);
        assert_eq!(marking.subword, Marker::None);
        assert!(!marking.uses_spacers());
    }

    #[test]
    fn test_joiner_only() {
        let flags = Flags {
            joiner_annotate: true,
            ..Default::default()
        };
        let marking = flags.boundary_marking();
        assert_eq!(marking.word, Marker::Joiner { standalone: false });
        assert_eq!(marking.subword, Marker::Joiner { standalone: false });
    }

    #[test]
    fn test_joiner_new_implies_joiner() {
        let flags = Flags {
            joiner_new: true,
            ..Default::default()
        };
        assert_eq!(
            flags.boundary_marking().word,
            Marker::Joiner { standalone: true }
        );
    }

    #[test]
    fn test_spacer_only() {
        let flags = Flags {
            spacer_new: true,
            ..Default::default()
        };
        let marking = flags.boundary_marking();
        assert_eq!(marking.word, Marker::Spacer { standalone: true });
        assert!(marking.uses_spacers());
    }

    #[test]
    fn test_both_split_by_boundary_kind() {
        let flags = Flags {
            joiner_annotate: true,
            spacer_annotate: true,
            ..Default::default()
        };
        let marking = flags.boundary_marking();
        assert_eq!(marking.word, Marker::Spacer { standalone: false });
        assert_eq!(marking.subword, Marker::Joiner { standalone: false });
        assert!(marking.uses_spacers());
    }

    #[test]
    fn test_case_markup_implies_segment_case() {
        let flags = Flags {
            case_markup: true,
            ..Default::default()
        };
        assert!(flags.splits_case());
        assert!(!Flags::default().splits_case());
    }

    #[test]
    fn test_missing_fields_default_to_false() {
        let flags: Flags = serde_json::from_str(r#"{"joiner_annotate": true}"#).unwrap();
        assert!(flags.joiner_annotate);
        assert!(!flags.case_markup);
    }
}
