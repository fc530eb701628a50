//! Domain error types
//!
//! This module defines the error taxonomy for the feedback pipeline.
//! Every variant carries identifiers and counts only: raw comment text,
//! names and other PII never appear in an error message.

use thiserror::Error;

/// Main error type
///
/// Stage-local variants (`DetectionBackend`, `GateViolation`, `ExternalCall`)
/// are converted into record-level terminal states by the orchestrator and
/// never abort a batch. `Configuration` is the only batch-fatal variant.
#[derive(Debug, Error)]
pub enum FerpaError {
    /// Configuration errors (batch-fatal)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A detection or extraction backend failed for a record
    #[error("Detection backend failure for record {record_id}: {message}")]
    DetectionBackend { record_id: String, message: String },

    /// The anonymization gate found residual PII and refused authorization
    #[error("Gate violation: record {record_id} was not authorized for external analysis")]
    GateViolation { record_id: String },

    /// The external semantic-analysis call failed after bounded retries
    #[error("External call failure for record {record_id}: {message}")]
    ExternalCall { record_id: String, message: String },

    /// De-anonymization was attempted with a mismatched or missing mapping
    #[error("Mapping integrity error: {0}")]
    MappingIntegrity(#[from] MappingIntegrityError),

    /// The batch run was cancelled before the record started
    #[error("Processing cancelled")]
    Cancelled,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl FerpaError {
    /// Short machine-readable label for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::DetectionBackend { .. } => "detection_backend_failure",
            Self::GateViolation { .. } => "gate_violation",
            Self::ExternalCall { .. } => "external_call_failure",
            Self::MappingIntegrity(_) => "mapping_integrity",
            Self::Cancelled => "cancelled",
            Self::Validation(_) => "validation",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }

    /// Whether retrying the same operation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalCall { .. } | Self::DetectionBackend { .. })
    }
}

/// Errors raised by de-anonymization
///
/// These are surfaced to the review collaborator as a distinct condition
/// rather than silently returning text with unresolved placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingIntegrityError {
    /// The text contains a placeholder the mapping does not know
    #[error("placeholder {placeholder} has no entry in the mapping")]
    UnknownPlaceholder { placeholder: String },

    /// The mapping holds a placeholder that does not occur in the text
    #[error("placeholder {placeholder} from the mapping does not occur in the text")]
    MissingPlaceholder { placeholder: String },

    /// The mapping belongs to a different record
    #[error("mapping belongs to record {actual}, expected {expected}")]
    RecordMismatch { expected: String, actual: String },

    /// No mapping was stored for an anonymized record
    #[error("no mapping available for record {record_id}")]
    MissingMapping { record_id: String },
}

/// Per-record error descriptor
///
/// Redacted by construction: holds the record id, an error class label and
/// the error's display string, which never contains record text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordError {
    /// Record the error belongs to
    pub record_id: String,

    /// Error class label (see [`FerpaError::kind`])
    pub kind: String,

    /// Pipeline stage that failed
    pub stage: Option<String>,

    /// Redacted error message
    pub message: String,

    /// Whether the error is retryable
    pub retryable: bool,
}

impl RecordError {
    /// Creates a new record error descriptor
    pub fn new(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            kind: "other".to_string(),
            stage: None,
            message: message.into(),
            retryable: false,
        }
    }

    /// Builds a descriptor from a pipeline error
    pub fn from_error(record_id: impl Into<String>, err: &FerpaError) -> Self {
        let mut detail = Self::new(record_id, err.to_string()).with_kind(err.kind());
        if err.is_retryable() {
            detail = detail.retryable();
        }
        detail
    }

    /// Sets the error class label
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the failing stage
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Marks the error as retryable
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for FerpaError {
    fn from(err: std::io::Error) -> Self {
        FerpaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FerpaError {
    fn from(err: serde_json::Error) -> Self {
        FerpaError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FerpaError {
    fn from(err: toml::de::Error) -> Self {
        FerpaError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FerpaError::Configuration("Invalid thresholds".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid thresholds");
    }

    #[test]
    fn test_gate_violation_carries_only_record_id() {
        let err = FerpaError::GateViolation {
            record_id: "rec-42".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("rec-42"));
        assert_eq!(err.kind(), "gate_violation");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_mapping_integrity_conversion() {
        let err: FerpaError = MappingIntegrityError::UnknownPlaceholder {
            placeholder: "[STUDENT_NAME_3]".to_string(),
        }
        .into();
        assert!(matches!(err, FerpaError::MappingIntegrity(_)));
        assert!(err.to_string().contains("[STUDENT_NAME_3]"));
    }

    #[test]
    fn test_record_error_builder() {
        let detail = RecordError::new("rec-1", "Test error")
            .with_kind("external_call_failure")
            .with_stage("externally_analyzed")
            .retryable();

        assert_eq!(detail.record_id, "rec-1");
        assert_eq!(detail.kind, "external_call_failure");
        assert_eq!(detail.stage.as_deref(), Some("externally_analyzed"));
        assert!(detail.retryable);
    }

    #[test]
    fn test_record_error_from_error() {
        let err = FerpaError::ExternalCall {
            record_id: "rec-7".to_string(),
            message: "timed out after 3 retries".to_string(),
        };
        let detail = RecordError::from_error("rec-7", &err);
        assert_eq!(detail.kind, "external_call_failure");
        assert!(detail.retryable);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: FerpaError = io_err.into();
        assert!(matches!(err, FerpaError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: FerpaError = toml_err.into();
        assert!(matches!(err, FerpaError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
