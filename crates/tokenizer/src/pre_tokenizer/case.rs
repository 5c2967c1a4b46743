//! Case markup: lowercasing tokens and the marker tokens recording their case.

use joinery_core::markers::{PH_MARKER_CLOSE, PH_MARKER_OPEN};
use joinery_core::{Casing, Token};
use regex::Regex;
use std::sync::OnceLock;

/// Record each token's casing and lowercase the ones that can be restored.
pub fn apply_case_markup(tokens: &mut [Token]) {
    for token in tokens.iter_mut().filter(|t| !t.is_placeholder) {
        let casing = Casing::of(&token.surface);
        token.casing = casing;
        if casing.is_restorable() && casing != Casing::Lowercase {
            token.surface = token.surface.to_lowercase();
        }
    }
}

/// A case markup token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMarker {
    /// Applies to the next token only.
    Modifier(Casing),
    /// Applies to every token up to the matching end marker.
    BeginRegion(Casing),
    EndRegion(Casing),
}

impl CaseMarker {
    /// Parse a marker token; anything else yields `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = marker_regex()?.captures(token)?;
        let casing = match &caps[2] {
            "C" => Casing::Capitalized,
            "U" => Casing::Uppercase,
            "L" => Casing::Lowercase,
            "M" => Casing::Mixed,
            _ => Casing::None,
        };
        match &caps[1] {
            "case_modifier" => Some(CaseMarker::Modifier(casing)),
            "begin_case_region" => Some(CaseMarker::BeginRegion(casing)),
            _ => Some(CaseMarker::EndRegion(casing)),
        }
    }

    /// Marker token text.
    pub fn render(self) -> String {
        let (kind, casing) = match self {
            CaseMarker::Modifier(c) => ("case_modifier", c),
            CaseMarker::BeginRegion(c) => ("begin_case_region", c),
            CaseMarker::EndRegion(c) => ("end_case_region", c),
        };
        format!(
            "{}mrk_{}_{}{}",
            PH_MARKER_OPEN,
            kind,
            casing_letter(casing),
            PH_MARKER_CLOSE
        )
    }
}

fn casing_letter(casing: Casing) -> char {
    match casing {
        Casing::Capitalized => 'C',
        Casing::Uppercase => 'U',
        Casing::Lowercase => 'L',
        Casing::Mixed => 'M',
        Casing::None => 'N',
    }
}

fn marker_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("^｟mrk_(case_modifier|begin_case_region|end_case_region)_([CULMN])｠$").ok()
    })
    .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::markers::{
        CASE_MODIFIER_CAPITALIZED, CASE_REGION_BEGIN_UPPER, CASE_REGION_END_UPPER,
    };

    #[test]
    fn test_apply_case_markup() {
        let mut tokens = vec![
            Token::new("Hello"),
            Token::new("WORLD"),
            Token::new("iPhone"),
            Token::new("42"),
            Token::placeholder("｟PH｠"),
        ];
        apply_case_markup(&mut tokens);
        let surfaces: Vec<_> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["hello", "world", "iPhone", "42", "｟PH｠"]);
        assert_eq!(tokens[0].casing, Casing::Capitalized);
        assert_eq!(tokens[1].casing, Casing::Uppercase);
        assert_eq!(tokens[2].casing, Casing::Mixed);
        assert_eq!(tokens[3].casing, Casing::None);
        assert_eq!(tokens[4].casing, Casing::None);
    }

    #[test]
    fn test_render_matches_reserved_markers() {
        assert_eq!(
            CaseMarker::Modifier(Casing::Capitalized).render(),
            CASE_MODIFIER_CAPITALIZED
        );
        assert_eq!(
            CaseMarker::BeginRegion(Casing::Uppercase).render(),
            CASE_REGION_BEGIN_UPPER
        );
        assert_eq!(
            CaseMarker::EndRegion(Casing::Uppercase).render(),
            CASE_REGION_END_UPPER
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            CaseMarker::parse(CASE_MODIFIER_CAPITALIZED),
            Some(CaseMarker::Modifier(Casing::Capitalized))
        );
        assert_eq!(
            CaseMarker::parse(CASE_REGION_END_UPPER),
            Some(CaseMarker::EndRegion(Casing::Uppercase))
        );
        assert_eq!(CaseMarker::parse("｟mrk_case_modifier_X｠"), None);
        assert_eq!(CaseMarker::parse("hello"), None);
    }
}
