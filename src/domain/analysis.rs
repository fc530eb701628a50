//! Per-stage analysis results carried on a [`Record`](super::Record)

use serde::{Deserialize, Serialize};

/// HIGH/MEDIUM/LOW classification of a 0-100 confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of matching the name found in a comment against the expected student
///
/// Holds names and therefore stays on local infrastructure; it is never
/// logged and never part of an external payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatchResult {
    /// Name found in the comment, if any
    pub extracted_name: Option<String>,

    /// Expected student name
    pub expected_name: String,

    /// Expected name or variant that produced the best score
    pub matched_variant: Option<String>,

    /// Similarity score, 0-100
    pub score: f64,

    /// Tier derived from the configured thresholds
    pub tier: ConfidenceTier,

    /// Whether the score reaches the similarity threshold
    pub is_match: bool,

    /// Backend that produced the extracted name
    pub extraction_method: String,
}

impl NameMatchResult {
    /// Result for a comment in which no name could be found
    ///
    /// Not a failure: a missing name cannot be confirmed and routes to review.
    pub fn no_name_found(expected_name: impl Into<String>, extraction_method: &str) -> Self {
        Self {
            extracted_name: None,
            expected_name: expected_name.into(),
            matched_variant: None,
            score: 0.0,
            tier: ConfidenceTier::Low,
            is_match: false,
            extraction_method: extraction_method.to_string(),
        }
    }

    /// Whether a name was found at all
    pub fn has_extracted_name(&self) -> bool {
        self.extracted_name.is_some()
    }
}

/// A grammar, spelling, or punctuation issue reported by the grammar collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarIssue {
    /// Rule identifier
    pub rule_id: String,

    /// Human-readable description
    pub message: String,

    /// Byte offset in the raw text
    pub offset: usize,

    /// Length of the flagged text in bytes
    pub length: usize,

    /// Suggested corrections
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Confidence, 0.0-1.0
    pub confidence: f64,
}

/// Completeness assessment of a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessResult {
    pub is_complete: bool,
    /// Weighted overall score, 0.0-1.0
    pub score: f64,
    pub confidence: ConfidenceTier,
    pub specificity_score: f64,
    pub actionability_score: f64,
    pub evidence_score: f64,
    pub length_score: f64,
    pub tone_score: f64,
    #[serde(default)]
    pub missing_elements: Vec<String>,
}

impl CompletenessResult {
    pub const SPECIFICITY_WEIGHT: f64 = 0.25;
    pub const ACTIONABILITY_WEIGHT: f64 = 0.25;
    pub const EVIDENCE_WEIGHT: f64 = 0.20;
    pub const LENGTH_WEIGHT: f64 = 0.15;
    pub const TONE_WEIGHT: f64 = 0.15;

    /// Minimum weighted score for a comment to count as complete
    pub const COMPLETE_THRESHOLD: f64 = 0.6;

    /// Builds a result from per-criterion scores (each clamped to 0.0-1.0)
    pub fn from_criteria(
        specificity: f64,
        actionability: f64,
        evidence: f64,
        length: f64,
        tone: f64,
        confidence: ConfidenceTier,
    ) -> Self {
        let specificity = specificity.clamp(0.0, 1.0);
        let actionability = actionability.clamp(0.0, 1.0);
        let evidence = evidence.clamp(0.0, 1.0);
        let length = length.clamp(0.0, 1.0);
        let tone = tone.clamp(0.0, 1.0);

        let score = specificity * Self::SPECIFICITY_WEIGHT
            + actionability * Self::ACTIONABILITY_WEIGHT
            + evidence * Self::EVIDENCE_WEIGHT
            + length * Self::LENGTH_WEIGHT
            + tone * Self::TONE_WEIGHT;

        let mut missing_elements = Vec::new();
        for (name, value) in [
            ("specific detail", specificity),
            ("actionable next step", actionability),
            ("supporting evidence", evidence),
            ("sufficient length", length),
            ("constructive tone", tone),
        ] {
            if value < 0.5 {
                missing_elements.push(name.to_string());
            }
        }

        Self {
            is_complete: score >= Self::COMPLETE_THRESHOLD,
            score,
            confidence,
            specificity_score: specificity,
            actionability_score: actionability,
            evidence_score: evidence,
            length_score: length,
            tone_score: tone,
            missing_elements,
        }
    }

    /// Routing signal on the 0-100 scale
    pub fn confidence_signal(&self) -> f64 {
        (self.score * 100.0).clamp(0.0, 100.0)
    }
}

/// Sentiment class used by the consistency check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Grade/comment consistency assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyResult {
    pub is_consistent: bool,
    pub confidence: ConfidenceTier,
    pub grade_sentiment: Sentiment,
    pub comment_sentiment: Sentiment,
}

impl ConsistencyResult {
    /// Routing signal on the 0-100 scale
    ///
    /// A confident inconsistency is a strong negative signal; a weak
    /// assessment in either direction lands in the review band.
    pub fn confidence_signal(&self) -> f64 {
        match (self.is_consistent, self.confidence) {
            (true, ConfidenceTier::High) => 100.0,
            (true, ConfidenceTier::Medium) => 90.0,
            (true, ConfidenceTier::Low) => 70.0,
            (false, ConfidenceTier::Low) => 60.0,
            (false, ConfidenceTier::Medium) => 40.0,
            (false, ConfidenceTier::High) => 10.0,
        }
    }
}

/// Output of the external semantic-analysis collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnalysis {
    pub completeness: Option<CompletenessResult>,
    pub consistency: Option<ConsistencyResult>,
}
