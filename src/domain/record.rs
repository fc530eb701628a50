//! Record domain model
//!
//! A [`Record`] is one evaluative comment about one student. Records are
//! values: every pipeline stage consumes the previous record and returns a
//! new one carrying all prior fields forward, so there is no shared mutable
//! record state between stages or workers.

use super::analysis::{GrammarIssue, NameMatchResult, SemanticAnalysis};
use super::errors::{FerpaError, RecordError};
use super::ids::{RecordId, StudentId};
use super::roster::RosterEntry;
use crate::anonymization::anonymizer::PlaceholderMapping;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline state of a record
///
/// States are ordered; a record only moves forward. `Routed` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "state", content = "route")]
pub enum RecordState {
    Ingested,
    GrammarChecked,
    NameVerified,
    Anonymized,
    GateAuthorized,
    ExternallyAnalyzed,
    Routed(RouteDecision),
    Failed,
}

impl RecordState {
    /// Position in the stage sequence
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Ingested => 0,
            Self::GrammarChecked => 1,
            Self::NameVerified => 2,
            Self::Anonymized => 3,
            Self::GateAuthorized => 4,
            Self::ExternallyAnalyzed => 5,
            Self::Routed(_) | Self::Failed => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Routed(_) | Self::Failed)
    }

    /// Stage label used in logs and error descriptors
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ingested => "ingested",
            Self::GrammarChecked => "grammar_checked",
            Self::NameVerified => "name_verified",
            Self::Anonymized => "anonymized",
            Self::GateAuthorized => "gate_authorized",
            Self::ExternallyAnalyzed => "externally_analyzed",
            Self::Routed(_) => "routed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routed(route) => write!(f, "routed({})", route.label()),
            other => f.write_str(other.label()),
        }
    }
}

/// Routing decision carried by a routed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDecision {
    AutoAccepted,
    NeedsReview,
    AutoRejected,
}

impl RouteDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AutoAccepted => "AUTO_ACCEPTED",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::AutoRejected => "AUTO_REJECTED",
        }
    }

    /// Severity used to pick the worst of several decisions
    pub fn severity(&self) -> u8 {
        match self {
            Self::AutoAccepted => 0,
            Self::NeedsReview => 1,
            Self::AutoRejected => 2,
        }
    }

    /// Review status a record starts with after routing
    pub fn initial_review_status(&self) -> ReviewStatus {
        match self {
            Self::AutoAccepted => ReviewStatus::Approved,
            Self::NeedsReview => ReviewStatus::Pending,
            Self::AutoRejected => ReviewStatus::Rejected,
        }
    }
}

/// Human review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Modified,
}

impl ReviewStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Modified => "modified",
        }
    }
}

/// One entry in a record's stage history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub state: RecordState,
    pub at: DateTime<Utc>,
}

/// One student comment and everything the pipeline learned about it
#[derive(Clone, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    student_id: Option<StudentId>,
    expected_name: String,
    #[serde(default)]
    known_variants: Vec<String>,
    text: String,
    #[serde(default)]
    grade: String,
    #[serde(default)]
    anonymized_text: Option<String>,
    #[serde(default)]
    mapping: Option<PlaceholderMapping>,
    #[serde(default)]
    grammar_issues: Vec<GrammarIssue>,
    #[serde(default)]
    name_match: Option<NameMatchResult>,
    #[serde(default)]
    semantic: Option<SemanticAnalysis>,
    state: RecordState,
    #[serde(default)]
    review_status: ReviewStatus,
    #[serde(default)]
    review_reasons: Vec<String>,
    #[serde(default)]
    external_analysis_skipped: bool,
    #[serde(default)]
    error: Option<RecordError>,
    #[serde(default)]
    history: Vec<StageTransition>,
}

impl Record {
    /// Creates a new builder for constructing a Record
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn student_id(&self) -> Option<&StudentId> {
        self.student_id.as_ref()
    }

    /// Expected student name for this comment
    pub fn expected_name(&self) -> &str {
        &self.expected_name
    }

    /// Known variants of the expected name
    pub fn known_variants(&self) -> &[String] {
        &self.known_variants
    }

    /// Raw comment text (contains PII, local use only)
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Grade or score label
    pub fn grade(&self) -> &str {
        &self.grade
    }

    pub fn anonymized_text(&self) -> Option<&str> {
        self.anonymized_text.as_deref()
    }

    /// Placeholder mapping written by the anonymizer
    pub fn mapping(&self) -> Option<&PlaceholderMapping> {
        self.mapping.as_ref()
    }

    pub fn grammar_issues(&self) -> &[GrammarIssue] {
        &self.grammar_issues
    }

    pub fn name_match(&self) -> Option<&NameMatchResult> {
        self.name_match.as_ref()
    }

    pub fn semantic(&self) -> Option<&SemanticAnalysis> {
        self.semantic.as_ref()
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Routing decision, once routed
    pub fn route(&self) -> Option<RouteDecision> {
        match self.state {
            RecordState::Routed(route) => Some(route),
            _ => None,
        }
    }

    pub fn review_status(&self) -> ReviewStatus {
        self.review_status
    }

    pub fn review_reasons(&self) -> &[String] {
        &self.review_reasons
    }

    /// Whether external analysis was skipped because the gate blocked the record
    pub fn external_analysis_skipped(&self) -> bool {
        self.external_analysis_skipped
    }

    pub fn error(&self) -> Option<&RecordError> {
        self.error.as_ref()
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    /// Whether the record is in a terminal pipeline state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn advance(mut self, next: RecordState) -> Self {
        self.state = next;
        self.history.push(StageTransition {
            state: next,
            at: Utc::now(),
        });
        self
    }

    pub(crate) fn with_grammar_issues(mut self, issues: Vec<GrammarIssue>) -> Self {
        self.grammar_issues = issues;
        self.advance(RecordState::GrammarChecked)
    }

    pub(crate) fn with_name_match(mut self, result: NameMatchResult) -> Self {
        self.name_match = Some(result);
        self.advance(RecordState::NameVerified)
    }

    /// Attaches anonymized text and its mapping
    ///
    /// The mapping is write-once: a record that already carries one moves to
    /// `Failed` instead of being overwritten.
    pub(crate) fn with_anonymization(
        mut self,
        anonymized_text: String,
        mapping: PlaceholderMapping,
    ) -> Self {
        if self.mapping.is_some() {
            let error = RecordError::new(
                self.id.as_str(),
                "record already carries a placeholder mapping",
            )
            .with_kind("validation")
            .with_stage(RecordState::Anonymized.label());
            return self.failed(error);
        }
        self.anonymized_text = Some(anonymized_text);
        self.mapping = Some(mapping);
        self.advance(RecordState::Anonymized)
    }

    pub(crate) fn gate_authorized(self) -> Self {
        self.advance(RecordState::GateAuthorized)
    }

    pub(crate) fn gate_blocked(mut self) -> Self {
        self.external_analysis_skipped = true;
        self
    }

    pub(crate) fn with_semantic(mut self, analysis: SemanticAnalysis) -> Self {
        self.semantic = Some(analysis);
        self.advance(RecordState::ExternallyAnalyzed)
    }

    pub(crate) fn routed(mut self, decision: RouteDecision, reasons: Vec<String>) -> Self {
        self.review_status = decision.initial_review_status();
        self.review_reasons = reasons;
        self.advance(RecordState::Routed(decision))
    }

    pub(crate) fn failed(mut self, error: RecordError) -> Self {
        self.error = Some(error);
        self.advance(RecordState::Failed)
    }

    pub(crate) fn with_review_status(mut self, status: ReviewStatus) -> Self {
        self.review_status = status;
        self
    }
}

// Raw text and names are deliberately absent from Debug output.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("student_id", &self.student_id)
            .field("text_len", &self.text.len())
            .field("anonymized", &self.anonymized_text.is_some())
            .field("state", &self.state)
            .field("review_status", &self.review_status)
            .field("external_analysis_skipped", &self.external_analysis_skipped)
            .finish()
    }
}

/// Builder for constructing Record instances
#[derive(Debug, Default)]
pub struct RecordBuilder {
    id: Option<RecordId>,
    student_id: Option<StudentId>,
    expected_name: Option<String>,
    known_variants: Vec<String>,
    text: Option<String>,
    grade: String,
}

impl RecordBuilder {
    /// Creates a new RecordBuilder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn student_id(mut self, student_id: StudentId) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn expected_name(mut self, name: impl Into<String>) -> Self {
        self.expected_name = Some(name.into());
        self
    }

    pub fn known_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Fills student id, expected name and variants from a roster entry
    pub fn student(mut self, entry: &RosterEntry) -> Self {
        self.student_id = Some(entry.student_id.clone());
        self.expected_name = Some(entry.full_name());
        self.known_variants = entry.known_variants();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    /// Builds the record in the `Ingested` state
    ///
    /// A missing id is generated; missing text or expected name is an error.
    pub fn build(self) -> crate::domain::Result<Record> {
        let text = self
            .text
            .ok_or_else(|| FerpaError::Validation("record text is required".to_string()))?;
        let expected_name = self
            .expected_name
            .ok_or_else(|| FerpaError::Validation("expected name is required".to_string()))?;

        Ok(Record {
            id: self.id.unwrap_or_else(RecordId::generate),
            student_id: self.student_id,
            expected_name,
            known_variants: self.known_variants,
            text,
            grade: self.grade,
            anonymized_text: None,
            mapping: None,
            grammar_issues: Vec::new(),
            name_match: None,
            semantic: None,
            state: RecordState::Ingested,
            review_status: ReviewStatus::Pending,
            review_reasons: Vec::new(),
            external_analysis_skipped: false,
            error: None,
            history: vec![StageTransition {
                state: RecordState::Ingested,
                at: Utc::now(),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::ConfidenceTier;

    fn record() -> Record {
        Record::builder()
            .id(RecordId::new("rec-1").unwrap())
            .expected_name("Jonathan Smith")
            .known_variants(["John Smith"])
            .text("John Smith did well this term")
            .grade("A")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let record = record();
        assert_eq!(record.state(), RecordState::Ingested);
        assert_eq!(record.review_status(), ReviewStatus::Pending);
        assert_eq!(record.history().len(), 1);
        assert!(record.mapping().is_none());
    }

    #[test]
    fn test_builder_requires_text() {
        let result = Record::builder().expected_name("A B").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_generates_missing_id() {
        let record = Record::builder()
            .expected_name("A B")
            .text("text")
            .build()
            .unwrap();
        assert!(!record.id().as_str().is_empty());
    }

    #[test]
    fn test_transitions_carry_fields_forward() {
        let record = record()
            .with_grammar_issues(Vec::new())
            .with_name_match(NameMatchResult {
                extracted_name: Some("John Smith".to_string()),
                expected_name: "Jonathan Smith".to_string(),
                matched_variant: Some("John Smith".to_string()),
                score: 100.0,
                tier: ConfidenceTier::High,
                is_match: true,
                extraction_method: "roster".to_string(),
            });

        assert_eq!(record.state(), RecordState::NameVerified);
        assert_eq!(record.text(), "John Smith did well this term");
        assert!(record.name_match().is_some());
        let ordinals: Vec<u8> = record.history().iter().map(|t| t.state.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn test_mapping_is_write_once() {
        let id = RecordId::new("rec-1").unwrap();
        let record = record().with_anonymization(
            "[STUDENT_NAME_1] did well".to_string(),
            PlaceholderMapping::new(id.clone()),
        );
        assert_eq!(record.state(), RecordState::Anonymized);

        let again = record.with_anonymization("x".to_string(), PlaceholderMapping::new(id));
        assert_eq!(again.state(), RecordState::Failed);
        assert_eq!(again.anonymized_text(), Some("[STUDENT_NAME_1] did well"));
        assert_eq!(again.error().map(|e| e.kind.as_str()), Some("validation"));
    }

    #[test]
    fn test_routing_sets_review_status() {
        let record = record().routed(RouteDecision::NeedsReview, vec!["reason".to_string()]);
        assert_eq!(record.route(), Some(RouteDecision::NeedsReview));
        assert_eq!(record.review_status(), ReviewStatus::Pending);
        assert!(record.is_terminal());
    }

    #[test]
    fn test_debug_omits_text() {
        let debug = format!("{:?}", record());
        assert!(!debug.contains("John"));
        assert!(debug.contains("rec-1"));
    }

    #[test]
    fn test_state_serde_shape() {
        let json = serde_json::to_string(&RecordState::Routed(RouteDecision::AutoAccepted)).unwrap();
        assert!(json.contains("ROUTED"));
        assert!(json.contains("AUTO_ACCEPTED"));
        let back: RecordState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RecordState::Routed(RouteDecision::AutoAccepted));
    }
}
