//! External semantic-analysis collaborator
//!
//! The analyzer is the only component that may send comment content across
//! the trust boundary. Its input type is [`SafeText`], which only the
//! anonymization gate can construct, so raw text cannot reach it.

use crate::anonymization::SafeText;
use crate::domain::{
    CompletenessResult, ConfidenceTier, ConsistencyResult, SemanticAnalysis, Sentiment,
};
use anyhow::Result;
use async_trait::async_trait;

/// Semantic-analysis backend
#[async_trait]
pub trait SemanticAnalyzer: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Analyze gate-authorized text against the record's grade label
    ///
    /// # Errors
    ///
    /// Transport, timeout and rate-limit failures. The orchestrator retries
    /// them and, once exhausted, fails the record.
    async fn analyze(&self, text: &SafeText, grade: &str) -> Result<SemanticAnalysis>;
}

/// Analyzer that returns no results
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAnalyzer;

#[async_trait]
impl SemanticAnalyzer for DisabledAnalyzer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn analyze(&self, _text: &SafeText, _grade: &str) -> Result<SemanticAnalysis> {
        Ok(SemanticAnalysis::default())
    }
}

const SPECIFIC: &[&str] = &[
    "essay", "project", "lab", "presentation", "report", "problem", "chapter", "unit",
    "fractions", "equations", "analysis", "thesis", "vocabulary", "experiment", "specifically",
    "particular", "notably",
];
const ACTIONABLE: &[&str] = &[
    "should", "next", "continue", "try", "practice", "focus", "goal", "recommend", "encourage",
    "improve", "review", "needs", "work on", "aim",
];
const EVIDENCE: &[&str] = &[
    "because", "for example", "for instance", "demonstrated", "showed", "shown", "evidenced",
    "test", "quiz", "assignment", "score", "scored", "completed", "submitted",
];
const POSITIVE: &[&str] = &[
    "excellent", "great", "strong", "outstanding", "well", "good", "impressive", "improved",
    "progress", "creative", "thoughtful", "wonderful", "proud", "consistent", "insightful",
];
const NEGATIVE: &[&str] = &[
    "poor", "struggles", "struggled", "missing", "late", "failed", "fails", "lacks", "weak",
    "incomplete", "disruptive", "careless", "concern", "concerning", "rarely", "never",
];

/// Deterministic local scorer
///
/// Keyword-based completeness and grade/comment sentiment agreement over
/// anonymized text. Placeholders are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn completeness(text: &str) -> CompletenessResult {
        let lower = text.to_lowercase();
        let words = lower
            .split_whitespace()
            .filter(|w| !w.starts_with('['))
            .count();

        let specificity = hits(&lower, SPECIFIC) as f64 / 2.0
            + if lower.chars().any(|c| c.is_ascii_digit()) { 0.5 } else { 0.0 };
        let actionability = hits(&lower, ACTIONABLE) as f64 / 2.0;
        let evidence = hits(&lower, EVIDENCE) as f64 / 2.0;
        let length = words as f64 / 40.0;
        let tone = 0.7 + 0.1 * hits(&lower, POSITIVE) as f64 - 0.2 * hits(&lower, NEGATIVE) as f64;

        let confidence = match words {
            0..=9 => ConfidenceTier::Low,
            10..=29 => ConfidenceTier::Medium,
            _ => ConfidenceTier::High,
        };

        CompletenessResult::from_criteria(specificity, actionability, evidence, length, tone, confidence)
    }

    fn consistency(text: &str, grade: &str) -> Option<ConsistencyResult> {
        let grade_sentiment = grade_sentiment(grade)?;
        let lower = text.to_lowercase();
        let positive = hits(&lower, POSITIVE);
        let negative = hits(&lower, NEGATIVE);

        let comment_sentiment = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        };
        let is_consistent = !matches!(
            (grade_sentiment, comment_sentiment),
            (Sentiment::Positive, Sentiment::Negative) | (Sentiment::Negative, Sentiment::Positive)
        );
        let confidence = match positive.abs_diff(negative) {
            0 => ConfidenceTier::Low,
            1 => ConfidenceTier::Medium,
            _ => ConfidenceTier::High,
        };

        Some(ConsistencyResult {
            is_consistent,
            confidence,
            grade_sentiment,
            comment_sentiment,
        })
    }
}

#[async_trait]
impl SemanticAnalyzer for HeuristicAnalyzer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn analyze(&self, text: &SafeText, grade: &str) -> Result<SemanticAnalysis> {
        Ok(SemanticAnalysis {
            completeness: Some(Self::completeness(text.as_str())),
            consistency: Self::consistency(text.as_str(), grade),
        })
    }
}

fn hits(lower: &str, terms: &[&str]) -> usize {
    terms
        .iter()
        .filter(|term| {
            lower.match_indices(**term).any(|(i, m)| {
                let before = lower[..i].chars().next_back();
                let after = lower[i + m.len()..].chars().next();
                !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
            })
        })
        .count()
}

/// Sentiment implied by a letter or numeric grade; `None` when unrecognized
pub fn grade_sentiment(grade: &str) -> Option<Sentiment> {
    let grade = grade.trim();
    if let Ok(score) = grade.trim_end_matches('%').parse::<f64>() {
        return Some(match score {
            s if s >= 80.0 => Sentiment::Positive,
            s if s >= 70.0 => Sentiment::Neutral,
            _ => Sentiment::Negative,
        });
    }

    match grade.chars().next()?.to_ascii_uppercase() {
        'A' | 'B' => Some(Sentiment::Positive),
        'C' => Some(Sentiment::Neutral),
        'D' | 'E' | 'F' => Some(Sentiment::Negative),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A", Some(Sentiment::Positive))]
    #[test_case("b+", Some(Sentiment::Positive))]
    #[test_case("C-", Some(Sentiment::Neutral))]
    #[test_case("F", Some(Sentiment::Negative))]
    #[test_case("92", Some(Sentiment::Positive))]
    #[test_case("75%", Some(Sentiment::Neutral))]
    #[test_case("40", Some(Sentiment::Negative))]
    #[test_case("", None)]
    #[test_case("Pass", None)]
    fn test_grade_sentiment(grade: &str, expected: Option<Sentiment>) {
        assert_eq!(grade_sentiment(grade), expected);
    }

    #[test]
    fn test_hits_respects_word_boundaries() {
        assert_eq!(hits("a great test", &["great", "test"]), 2);
        assert_eq!(hits("greatest", &["great"]), 0);
        assert_eq!(hits("latest", &["late", "test"]), 0);
    }

    #[test]
    fn test_thin_comment_is_incomplete() {
        let result = HeuristicAnalyzer::completeness("Good job.");
        assert!(!result.is_complete);
        assert_eq!(result.confidence, ConfidenceTier::Low);
    }

    #[test]
    fn test_rich_comment_is_complete() {
        let text = "[STUDENT_NAME_1] demonstrated strong analysis in the lab report, \
                    for example the experiment on fractions scored 92 on the unit test. \
                    [STUDENT_NAME_1] should continue to practice equations and focus on \
                    showing work, because the next unit builds on it. Excellent progress \
                    this term and a thoughtful, consistent effort in every assignment.";
        let result = HeuristicAnalyzer::completeness(text);
        assert!(result.is_complete, "score was {}", result.score);
    }

    #[test]
    fn test_inconsistent_grade_and_comment() {
        let result =
            HeuristicAnalyzer::consistency("Work is missing, late and careless.", "A").unwrap();
        assert!(!result.is_consistent);
        assert_eq!(result.comment_sentiment, Sentiment::Negative);
        assert_eq!(result.confidence, ConfidenceTier::High);
    }

    #[test]
    fn test_unknown_grade_skips_consistency() {
        assert!(HeuristicAnalyzer::consistency("Great work.", "").is_none());
    }
}
