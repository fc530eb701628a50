//! Fuzzy name matching
//!
//! Scores are token-order-insensitive: tokens are sorted before a normalized
//! Levenshtein similarity is taken, so "Smith, John" and "John Smith" agree.
//! Every comparison is tried over the raw normalized form, the compact form
//! (apostrophes and hyphens removed) and nickname expansions, and the best
//! score wins.

use super::normalize::{compact, normalize_name, tokens};
use super::NicknameTable;
use crate::core::pipeline::ConfidenceThresholds;
use crate::domain::NameMatchResult;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default minimum similarity for `is_match`
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;

/// A candidate name found in comment text
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedName {
    pub name: String,
    /// Extractor confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl ExtractedName {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Token-sort similarity between two already-normalized strings (0-100)
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sort = |s: &str| {
        let mut t = tokens(s);
        t.sort_unstable();
        t.join(" ")
    };
    let (a, b) = (sort(a), sort(b));
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b) * 100.0
}

/// Matches extracted names against an expected identity
#[derive(Debug, Clone)]
pub struct NameMatcher {
    nicknames: Arc<NicknameTable>,
    similarity_threshold: f64,
    thresholds: ConfidenceThresholds,
}

impl NameMatcher {
    pub fn new(nicknames: Arc<NicknameTable>) -> Self {
        Self {
            nicknames,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            thresholds: ConfidenceThresholds::default(),
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// Best similarity between two names over every comparison form
    pub fn score(&self, extracted: &str, target: &str) -> f64 {
        let left = self.forms(&normalize_name(extracted));
        let right = self.forms(&normalize_name(target));

        let mut best: f64 = 0.0;
        for a in &left {
            for b in &right {
                best = best.max(token_sort_ratio(a, b));
                best = best.max(single_token_score(a, b));
            }
        }
        best
    }

    /// Match one extracted name against the expected name and its variants
    ///
    /// `None` means no name was found; the result is LOW and unmatched.
    pub fn match_name(
        &self,
        extracted: Option<&str>,
        expected_name: &str,
        known_variants: &[String],
        extraction_method: &str,
    ) -> NameMatchResult {
        let Some(extracted) = extracted.filter(|e| !e.trim().is_empty()) else {
            return NameMatchResult::no_name_found(expected_name, extraction_method);
        };

        let mut best_score = 0.0;
        let mut best_variant: Option<&str> = None;
        for target in std::iter::once(expected_name).chain(known_variants.iter().map(String::as_str)) {
            let score = self.score(extracted, target);
            if score > best_score || best_variant.is_none() {
                best_score = score;
                best_variant = Some(target);
            }
        }

        NameMatchResult {
            extracted_name: Some(extracted.to_string()),
            expected_name: expected_name.to_string(),
            matched_variant: best_variant.map(str::to_string),
            score: best_score,
            tier: self.thresholds.tier(best_score),
            is_match: best_score >= self.similarity_threshold,
            extraction_method: extraction_method.to_string(),
        }
    }

    /// Match the best of several extracted names
    ///
    /// Names are tried in order and the highest score wins; ties keep the
    /// earlier name.
    pub fn match_best(
        &self,
        extracted: &[ExtractedName],
        expected_name: &str,
        known_variants: &[String],
        extraction_method: &str,
    ) -> NameMatchResult {
        extracted
            .iter()
            .map(|e| {
                self.match_name(
                    Some(&e.name),
                    expected_name,
                    known_variants,
                    extraction_method,
                )
            })
            .fold(None, |best: Option<NameMatchResult>, candidate| match best {
                Some(b) if b.score >= candidate.score => Some(b),
                _ => Some(candidate),
            })
            .unwrap_or_else(|| NameMatchResult::no_name_found(expected_name, extraction_method))
    }

    /// Raw, compact and nickname-expanded forms of a normalized name
    fn forms(&self, normalized: &str) -> BTreeSet<String> {
        let mut forms = BTreeSet::new();
        if normalized.is_empty() {
            return forms;
        }
        forms.insert(normalized.to_string());

        let toks = tokens(normalized);
        for (i, tok) in toks.iter().enumerate() {
            for canonical in self.nicknames.canonical_forms(tok) {
                let mut expanded: Vec<&str> = toks.clone();
                expanded[i] = canonical.as_str();
                forms.insert(expanded.join(" "));
            }
        }

        let compacted: Vec<String> = forms.iter().map(|f| compact(f)).collect();
        forms.extend(compacted);
        forms
    }
}

/// A one-token name scored against the first or last token of the other side
fn single_token_score(a: &str, b: &str) -> f64 {
    let (ta, tb) = (tokens(a), tokens(b));
    let (single, other) = match (ta.len(), tb.len()) {
        (1, n) if n > 1 => (ta[0], tb),
        (n, 1) if n > 1 => (tb[0], ta),
        _ => return 0.0,
    };
    let first = other.first().copied().unwrap_or_default();
    let last = other.last().copied().unwrap_or_default();
    token_sort_ratio(single, first).max(token_sort_ratio(single, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfidenceTier;

    fn matcher() -> NameMatcher {
        NameMatcher::new(Arc::new(NicknameTable::from_pairs([
            ("john", vec!["jonathan", "john"]),
            ("bill", vec!["william"]),
            ("liz", vec!["elizabeth"]),
        ])))
    }

    #[test]
    fn test_exact_match_is_high() {
        let result = matcher().match_name(
            Some("John Smith"),
            "Jonathan Smith",
            &["John Smith".to_string()],
            "roster",
        );
        assert_eq!(result.tier, ConfidenceTier::High);
        assert!(result.is_match);
        assert_eq!(result.matched_variant.as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_token_order_insensitive() {
        assert_eq!(matcher().score("Smith, John", "John Smith"), 100.0);
    }

    #[test]
    fn test_nickname_expansion() {
        let score = matcher().score("Bill Turner", "William Turner");
        assert_eq!(score, 100.0);
        let score = matcher().score("Liz Park", "Elizabeth Park");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_apostrophe_tolerant() {
        let result = matcher().match_name(Some("Obrien"), "Mary O'Brien", &[], "capitalized");
        assert!(result.tier >= ConfidenceTier::Medium);
        assert!(result.is_match);
    }

    #[test]
    fn test_single_token_uses_first_or_last() {
        assert_eq!(matcher().score("Mary", "Mary O'Brien"), 100.0);
        assert_eq!(matcher().score("Turner", "William Turner"), 100.0);
    }

    #[test]
    fn test_suffix_ignored() {
        assert_eq!(matcher().score("John Smith Jr.", "John Smith"), 100.0);
    }

    #[test]
    fn test_unrelated_name_is_low() {
        let result = matcher().match_name(Some("Carlos Ruiz"), "Mary O'Brien", &[], "roster");
        assert_eq!(result.tier, ConfidenceTier::Low);
        assert!(!result.is_match);
    }

    #[test]
    fn test_no_name_is_low_not_error() {
        let result = matcher().match_name(None, "Mary O'Brien", &[], "roster");
        assert_eq!(result.tier, ConfidenceTier::Low);
        assert!(!result.has_extracted_name());

        let result = matcher().match_best(&[], "Mary O'Brien", &[], "roster");
        assert!(!result.has_extracted_name());
    }

    #[test]
    fn test_match_best_picks_highest() {
        let extracted = vec![
            ExtractedName::new("Carlos", 0.6),
            ExtractedName::new("Mary", 0.6),
        ];
        let result = matcher().match_best(&extracted, "Mary O'Brien", &[], "capitalized");
        assert_eq!(result.extracted_name.as_deref(), Some("Mary"));
    }

    #[test]
    fn test_token_sort_ratio_bounds() {
        assert_eq!(token_sort_ratio("", ""), 0.0);
        assert_eq!(token_sort_ratio("ana", "ana"), 100.0);
        let partial = token_sort_ratio("ana", "anna");
        assert!(partial > 0.0 && partial < 100.0);
    }
}
