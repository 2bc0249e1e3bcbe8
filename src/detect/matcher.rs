//! Per-utterance pattern matching.
//!
//! Scores one utterance against every pattern in the catalog and returns
//! the single best match. Matching is deliberately plain: lowercase
//! substring containment, no word boundaries, no regular expressions, so
//! "antivirus" hits the "virus" keyword. Transcribed speech is noisy and
//! the term lists are curated with that in mind.

use crate::catalog::{PatternCatalog, PatternDefinition, Severity};
use crate::config::ScoringConfig;

// ── Match result ──────────────────────────────────────────────────

/// Best-scoring pattern for a single utterance.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Id of the winning pattern.
    pub pattern_id: String,
    /// Name of the winning pattern.
    pub pattern_name: String,
    /// Severity of the winning pattern.
    pub severity: Severity,
    /// Weighted score for this utterance alone.
    pub score: u32,
    /// Keywords that hit, in definition order.
    pub matched_keywords: Vec<String>,
    /// Phrases that hit, in definition order.
    pub matched_phrases: Vec<String>,
}

impl MatchResult {
    /// All matched terms, keywords first, each group in definition order.
    pub fn matched_terms(&self) -> Vec<String> {
        let mut terms = self.matched_keywords.clone();
        terms.extend(self.matched_phrases.iter().cloned());
        terms
    }
}

// ── Matching ──────────────────────────────────────────────────────

/// Score `text` against every pattern and return the best match.
///
/// Each distinct keyword found contributes `keyword_weight` points, each
/// distinct phrase `phrase_weight`; a term counts once no matter how often
/// it occurs. Only a strictly higher score replaces the running best, so
/// the earliest pattern in catalog order takes ties. Returns `None` when no
/// pattern scores above zero.
pub fn match_utterance(
    text: &str,
    catalog: &PatternCatalog,
    scoring: &ScoringConfig,
) -> Option<MatchResult> {
    let lowered = text.to_lowercase();
    let mut best: Option<MatchResult> = None;

    for pattern in catalog.iter() {
        let candidate = score_pattern(&lowered, pattern, scoring);
        if candidate.score == 0 {
            continue;
        }
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    best
}

/// Score one pattern against pre-lowercased text.
fn score_pattern(
    lowered: &str,
    pattern: &PatternDefinition,
    scoring: &ScoringConfig,
) -> MatchResult {
    let matched_keywords: Vec<String> = pattern
        .keywords
        .iter()
        .filter(|term| lowered.contains(&term.to_lowercase()))
        .cloned()
        .collect();
    let matched_phrases: Vec<String> = pattern
        .phrases
        .iter()
        .filter(|term| lowered.contains(&term.to_lowercase()))
        .cloned()
        .collect();

    let score = scoring.keyword_weight * matched_keywords.len() as u32
        + scoring.phrase_weight * matched_phrases.len() as u32;

    MatchResult {
        pattern_id: pattern.id.clone(),
        pattern_name: pattern.name.clone(),
        severity: pattern.severity,
        score,
        matched_keywords,
        matched_phrases,
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PatternCatalog {
        PatternCatalog::builtin()
    }

    fn scoring() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn credential_request_matches_it_support() {
        let result =
            match_utterance("I need you to verify your password right now", &catalog(), &scoring())
                .unwrap();
        assert_eq!(result.pattern_name, "IT Support Credential Harvesting");
        // "password" keyword (20) + "verify your password" phrase (35)
        assert_eq!(result.score, 55);
        assert_eq!(result.matched_keywords, vec!["password"]);
        assert_eq!(result.matched_phrases, vec!["verify your password"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = match_utterance("VERIFY YOUR PASSWORD", &catalog(), &scoring()).unwrap();
        assert_eq!(result.pattern_id, "2");
        assert_eq!(result.score, 55);
    }

    #[test]
    fn containment_not_word_boundary() {
        // "antivirus" contains "virus"
        let result = match_utterance("my antivirus is great", &catalog(), &scoring()).unwrap();
        assert_eq!(result.pattern_name, "Tech Support Scam");
        assert_eq!(result.score, 20);
        assert_eq!(result.matched_keywords, vec!["virus"]);
    }

    #[test]
    fn benign_text_matches_nothing() {
        assert!(match_utterance("lovely weather today", &catalog(), &scoring()).is_none());
        assert!(match_utterance("", &catalog(), &scoring()).is_none());
    }

    #[test]
    fn only_best_pattern_reported() {
        // Hits both pattern 2 (password 20 + verify your password 35 = 55)
        // and pattern 3 (verify 20, account 20, unusual activity 20 + unusual
        // activity detected 35 = 95); pattern 3 wins outright.
        let result = match_utterance(
            "unusual activity detected on your account, verify your password",
            &catalog(),
            &scoring(),
        )
        .unwrap();
        assert_eq!(result.pattern_name, "Urgent Account Verification");
        assert_eq!(result.score, 95);
    }

    #[test]
    fn ties_go_to_earlier_catalog_order() {
        let first = PatternDefinition {
            id: "a".into(),
            name: "First".into(),
            description: String::new(),
            severity: Severity::High,
            keywords: vec!["alpha".into()],
            phrases: vec![],
        };
        let second = PatternDefinition {
            id: "b".into(),
            name: "Second".into(),
            description: String::new(),
            severity: Severity::High,
            keywords: vec!["beta".into()],
            phrases: vec![],
        };
        let catalog = PatternCatalog::new(vec![first, second]).unwrap();

        let result = match_utterance("alpha and beta together", &catalog, &scoring()).unwrap();
        assert_eq!(result.pattern_id, "a");
        assert_eq!(result.score, 20);
    }

    #[test]
    fn term_counts_once_regardless_of_repeats() {
        let result =
            match_utterance("urgent urgent urgent", &catalog(), &scoring()).unwrap();
        assert_eq!(result.pattern_name, "CEO Fraud / Executive Impersonation");
        assert_eq!(result.score, 20);
        assert_eq!(result.matched_keywords, vec!["urgent"]);
    }

    #[test]
    fn matched_terms_keywords_before_phrases() {
        let result = match_utterance(
            "this is urgent, wire the money asap",
            &catalog(),
            &scoring(),
        )
        .unwrap();
        assert_eq!(result.pattern_id, "1");
        // keywords in definition order, then phrases in definition order
        assert_eq!(
            result.matched_terms(),
            vec!["urgent", "ASAP", "wire the money", "this is urgent"]
        );
        // 2 keywords + 2 phrases
        assert_eq!(result.score, 2 * 20 + 2 * 35);
    }

    #[test]
    fn custom_weights_respected() {
        let scoring = ScoringConfig {
            keyword_weight: 1,
            phrase_weight: 2,
            ..ScoringConfig::default()
        };
        let result =
            match_utterance("verify your password", &catalog(), &scoring).unwrap();
        assert_eq!(result.score, 1 + 2);
    }
}
