//! Entity span data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity types recognized in student comments
///
/// Covers the FERPA directory and personally identifiable information that
/// appears in free-text teacher feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// A name matched against the class roster
    StudentName,
    /// Any other person name
    Person,
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// Social Security Numbers
    Ssn,
    /// Student identification numbers
    StudentId,
    /// Grade-level phrases ("10th grade", "sophomore")
    GradeLevel,
    /// School and institution names
    School,
}

impl EntityType {
    /// Every entity type, in declaration order
    pub const ALL: [EntityType; 8] = [
        Self::StudentName,
        Self::Person,
        Self::Email,
        Self::Phone,
        Self::Ssn,
        Self::StudentId,
        Self::GradeLevel,
        Self::School,
    ];

    /// Tag used inside placeholders, e.g. `STUDENT_NAME` in `[STUDENT_NAME_1]`
    pub fn label(&self) -> &'static str {
        match self {
            Self::StudentName => "STUDENT_NAME",
            Self::Person => "PERSON",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Ssn => "SSN",
            Self::StudentId => "STUDENT_ID",
            Self::GradeLevel => "GRADE_LEVEL",
            Self::School => "SCHOOL",
        }
    }

    /// Parses a label or common alias
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STUDENT_NAME" => Some(Self::StudentName),
            "PERSON" | "NAME" => Some(Self::Person),
            "EMAIL" | "EMAIL_ADDRESS" => Some(Self::Email),
            "PHONE" | "PHONE_NUMBER" => Some(Self::Phone),
            "SSN" | "US_SSN" => Some(Self::Ssn),
            "STUDENT_ID" => Some(Self::StudentId),
            "GRADE_LEVEL" => Some(Self::GradeLevel),
            "SCHOOL" | "SCHOOL_NAME" => Some(Self::School),
            _ => None,
        }
    }

    /// Whether the type names a person
    pub fn is_name(&self) -> bool {
        matches!(self, Self::StudentName | Self::Person)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detection method used to find a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Pattern library match
    Regex,
    /// Roster name match
    Roster,
    /// Named-entity style heuristic or model
    Ner,
}

/// A detected entity span
///
/// Offsets are byte offsets into the scanned text and always fall on
/// character boundaries. The span holds no copy of the matched text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Entity type
    pub entity_type: EntityType,
    /// Detector confidence (0.0 - 1.0)
    pub score: f32,
    /// Detection method used
    pub method: DetectionMethod,
}

impl EntitySpan {
    /// Create a new span; the score is clamped to 0.0 - 1.0
    pub fn new(
        start: usize,
        end: usize,
        entity_type: EntityType,
        score: f32,
        method: DetectionMethod,
    ) -> Self {
        Self {
            start,
            end,
            entity_type,
            score: score.clamp(0.0, 1.0),
            method,
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely within this span
    pub fn contains(&self, other: &EntitySpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one byte
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for ty in [
            EntityType::StudentName,
            EntityType::Person,
            EntityType::Email,
            EntityType::Phone,
            EntityType::Ssn,
            EntityType::StudentId,
            EntityType::GradeLevel,
            EntityType::School,
        ] {
            assert_eq!(EntityType::from_label(ty.label()), Some(ty));
        }
        assert_eq!(EntityType::from_label("us_ssn"), Some(EntityType::Ssn));
        assert_eq!(EntityType::from_label("DATE"), None);
    }

    #[test]
    fn test_containment_and_overlap() {
        let outer = EntitySpan::new(0, 10, EntityType::Person, 0.5, DetectionMethod::Ner);
        let inner = EntitySpan::new(2, 6, EntityType::StudentName, 0.99, DetectionMethod::Roster);
        let partial = EntitySpan::new(8, 14, EntityType::School, 0.8, DetectionMethod::Regex);
        let apart = EntitySpan::new(10, 12, EntityType::Email, 0.9, DetectionMethod::Regex);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&partial));
        assert!(!outer.contains(&partial));
        assert!(!outer.overlaps(&apart));
    }

    #[test]
    fn test_score_clamped() {
        let span = EntitySpan::new(0, 1, EntityType::Ssn, 1.7, DetectionMethod::Regex);
        assert_eq!(span.score, 1.0);
    }
}
