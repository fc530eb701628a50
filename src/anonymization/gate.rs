//! FERPA compliance gate
//!
//! The gate is the only producer of [`SafeText`], and [`SafeText`] is the only
//! text type the semantic analyzer accepts. A call site that skips the gate
//! therefore has nothing it can hand to the external call.
//!
//! Authorization is a double verification: the anonymized text is scanned
//! again, and any entity span blocks the record unless it lies inside a
//! placeholder the record's own mapping produced, or covers exactly a
//! placeholder token of a known entity type. Every attempt is audited,
//! including attempts where anonymization itself fails.

use crate::anonymization::anonymizer::{placeholder_ranges, Anonymizer};
use crate::anonymization::audit::{AuditEntry, AuditOutcome, AuditSink};
use crate::anonymization::anonymizer::PlaceholderMapping;
use crate::anonymization::compliance::AnonymizeBeforeApi;
use crate::anonymization::detector::EntityDetector;
use crate::anonymization::models::{EntitySpan, EntityType};
use crate::domain::{FerpaError, Record, RecordId, Result};
use std::borrow::Cow;
use std::sync::Arc;

/// Anonymized text that passed the gate
///
/// Cannot be constructed outside this module and cannot be deserialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeText {
    record_id: RecordId,
    text: String,
}

impl SafeText {
    fn authorized(record_id: RecordId, text: String) -> Self {
        Self { record_id, text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Record the text was authorized for
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl AsRef<str> for SafeText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Gate in front of every external call
pub struct AnonymizationGate {
    anonymizer: Arc<Anonymizer>,
    verifier: Arc<dyn EntityDetector>,
    audit: Arc<dyn AuditSink>,
    policy: AnonymizeBeforeApi,
}

impl AnonymizationGate {
    /// Create a gate that re-scans with the anonymizer's own detector
    pub fn new(anonymizer: Arc<Anonymizer>, audit: Arc<dyn AuditSink>) -> Self {
        let verifier = Arc::clone(anonymizer.detector());
        Self {
            anonymizer,
            verifier,
            audit,
            policy: AnonymizeBeforeApi,
        }
    }

    /// Use a separate detector for the verification re-scan
    pub fn with_verifier(mut self, verifier: Arc<dyn EntityDetector>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn policy(&self) -> AnonymizeBeforeApi {
        self.policy
    }

    /// Authorize a record's text for the external call
    ///
    /// A record that has not been through the anonymizer is anonymized here
    /// for the check; that mapping is not kept, so callers that need to
    /// restore the text run the anonymization stage first.
    ///
    /// # Errors
    ///
    /// - [`FerpaError::GateViolation`] when the re-scan finds residual
    ///   entities or cannot complete
    /// - [`FerpaError::DetectionBackend`] when anonymization itself fails
    /// - [`FerpaError::Io`] when the audit entry cannot be written; the
    ///   text is not released without its audit record
    pub fn authorize_for_external_call(&self, record: &Record) -> Result<SafeText> {
        let record_id = record.id();
        let fresh;
        let (candidate, mapping): (Cow<'_, str>, &PlaceholderMapping) =
            match (record.anonymized_text(), record.mapping()) {
                (Some(text), Some(mapping)) => (Cow::Borrowed(text), mapping),
                _ => {
                    let anonymized = match self.anonymizer.anonymize(record) {
                        Ok(anonymized) => anonymized,
                        Err(e) => {
                            tracing::warn!(
                                record_id = %record_id,
                                error = %e,
                                "Gate could not anonymize record"
                            );
                            // No anonymized text exists, so the entry hashes an empty payload
                            self.write_audit(AuditEntry::new(
                                record_id.as_str(),
                                AuditOutcome::VerificationFailed,
                                "",
                            ))?;
                            return Err(FerpaError::DetectionBackend {
                                record_id: record_id.to_string(),
                                message: format!("{e:#}"),
                            });
                        }
                    };
                    fresh = anonymized.mapping;
                    (Cow::Owned(anonymized.text), &fresh)
                }
            };

        let placeholders = placeholder_ranges(&candidate);
        let mapped: Vec<(usize, usize)> = placeholders
            .iter()
            .copied()
            .filter(|(start, end)| mapping.contains(&candidate[*start..*end]))
            .collect();

        let spans = match self.verifier.detect(&candidate) {
            Ok(spans) => spans,
            Err(e) => {
                tracing::warn!(
                    record_id = %record_id,
                    backend = self.verifier.name(),
                    error = %e,
                    "Gate verification scan failed"
                );
                self.write_audit(
                    AuditEntry::new(record_id.as_str(), AuditOutcome::VerificationFailed, &candidate)
                        .with_placeholder_count(placeholders.len()),
                )?;
                return Err(FerpaError::GateViolation {
                    record_id: record_id.to_string(),
                });
            }
        };

        let residual = residual_spans(&spans, &mapped, &placeholders);
        if !residual.is_empty() {
            let mut types: Vec<EntityType> = residual.iter().map(|s| s.entity_type).collect();
            types.sort();
            types.dedup();
            crate::log_gate_blocked!(record_id, residual.len());
            self.write_audit(
                AuditEntry::new(record_id.as_str(), AuditOutcome::Blocked, &candidate)
                    .with_placeholder_count(placeholders.len())
                    .with_residual_types(types),
            )?;
            return Err(FerpaError::GateViolation {
                record_id: record_id.to_string(),
            });
        }

        self.write_audit(
            AuditEntry::new(record_id.as_str(), AuditOutcome::Authorized, &candidate)
                .with_placeholder_count(placeholders.len()),
        )?;
        tracing::debug!(
            record_id = %record_id,
            placeholders = placeholders.len(),
            "Gate authorized external analysis"
        );

        Ok(SafeText::authorized(record_id.clone(), candidate.into_owned()))
    }

    fn write_audit(&self, entry: AuditEntry) -> Result<()> {
        self.audit.record(&entry).map_err(|e| {
            FerpaError::Io(format!(
                "audit entry for record {} could not be written: {e:#}",
                entry.record_id
            ))
        })
    }
}

/// Spans the re-scan found that are not accounted for by a placeholder
///
/// `mapped` holds the ranges of placeholders the record's mapping produced;
/// a span wholly inside one of those is exempt. `placeholders` holds every
/// known-label token; a span is exempt only when it covers one exactly.
/// Partial overlaps and spans inside an unmapped token still count.
fn residual_spans<'a>(
    spans: &'a [EntitySpan],
    mapped: &[(usize, usize)],
    placeholders: &[(usize, usize)],
) -> Vec<&'a EntitySpan> {
    spans
        .iter()
        .filter(|s| !s.is_empty())
        .filter(|s| !mapped.iter().any(|(ps, pe)| *ps <= s.start && s.end <= *pe))
        .filter(|s| !placeholders.iter().any(|(ps, pe)| *ps == s.start && s.end == *pe))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::audit::MemoryAuditSink;
    use crate::anonymization::detector::RegexDetector;
    use crate::anonymization::models::DetectionMethod;

    struct AlwaysFlags;

    impl EntityDetector for AlwaysFlags {
        fn name(&self) -> &str {
            "always_flags"
        }

        fn detect(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
            let end = text.find(' ').unwrap_or(text.len());
            Ok(vec![EntitySpan::new(
                0,
                end,
                EntityType::Person,
                0.9,
                DetectionMethod::Ner,
            )])
        }
    }

    struct Broken;

    impl EntityDetector for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _text: &str) -> anyhow::Result<Vec<EntitySpan>> {
            anyhow::bail!("model unavailable")
        }
    }

    fn record(text: &str) -> Record {
        Record::builder()
            .id(RecordId::new("rec-1").unwrap())
            .expected_name("Ana Lopez")
            .text(text)
            .build()
            .unwrap()
    }

    fn gate(sink: Arc<MemoryAuditSink>) -> AnonymizationGate {
        let anonymizer = Arc::new(Anonymizer::new(Arc::new(RegexDetector::new().unwrap())));
        AnonymizationGate::new(anonymizer, sink)
    }

    #[test]
    fn test_authorizes_clean_text() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gate = gate(Arc::clone(&sink));
        let safe = gate
            .authorize_for_external_call(&record("Reach me at ana@example.com."))
            .unwrap();

        assert_eq!(safe.as_str(), "Reach me at [EMAIL_1].");
        assert_eq!(safe.record_id().as_str(), "rec-1");
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::Authorized);
        assert_eq!(entries[0].placeholder_count, 1);
    }

    #[test]
    fn test_blocks_residual_and_audits() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gate = gate(Arc::clone(&sink)).with_verifier(Arc::new(AlwaysFlags));

        let err = gate
            .authorize_for_external_call(&record("Maria worked hard."))
            .unwrap_err();

        assert!(matches!(err, FerpaError::GateViolation { .. }));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::Blocked);
        assert_eq!(entries[0].residual_types, vec![EntityType::Person]);
    }

    /// Flags the first occurrence of a fixed word as a person
    struct FlagsWord(&'static str);

    impl EntityDetector for FlagsWord {
        fn name(&self) -> &str {
            "flags_word"
        }

        fn detect(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
            Ok(text
                .find(self.0)
                .map(|start| {
                    EntitySpan::new(
                        start,
                        start + self.0.len(),
                        EntityType::Person,
                        0.85,
                        DetectionMethod::Ner,
                    )
                })
                .into_iter()
                .collect())
        }
    }

    #[test]
    fn test_span_covering_known_placeholder_is_not_residual() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gate = gate(Arc::clone(&sink)).with_verifier(Arc::new(AlwaysFlags));

        // AlwaysFlags reports the first word, which is exactly a placeholder here.
        let result = gate.authorize_for_external_call(&record("[STUDENT_NAME_1] worked hard."));
        assert!(result.is_ok());
        assert_eq!(sink.entries()[0].outcome, AuditOutcome::Authorized);
    }

    #[test]
    fn test_name_inside_bracket_token_is_blocked() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gate = gate(Arc::clone(&sink)).with_verifier(Arc::new(FlagsWord("JOHN_SMITH")));

        let err = gate
            .authorize_for_external_call(&record("[JOHN_SMITH_1] missed class."))
            .unwrap_err();

        assert!(matches!(err, FerpaError::GateViolation { .. }));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::Blocked);
        assert_eq!(entries[0].residual_types, vec![EntityType::Person]);
        assert_eq!(entries[0].placeholder_count, 0);
    }

    #[test]
    fn test_name_inside_bracket_token_is_anonymized_then_authorized() {
        let sink = Arc::new(MemoryAuditSink::new());
        let detector: Arc<dyn EntityDetector> = Arc::new(FlagsWord("JOHN_SMITH"));
        let gate = AnonymizationGate::new(Arc::new(Anonymizer::new(Arc::clone(&detector))), sink);

        let safe = gate
            .authorize_for_external_call(&record("[JOHN_SMITH_1] missed class."))
            .unwrap();

        assert!(!safe.as_str().contains("JOHN_SMITH"));
        assert!(detector.detect(safe.as_str()).unwrap().is_empty());
    }

    #[test]
    fn test_anonymization_failure_is_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let anonymizer = Arc::new(Anonymizer::new(Arc::new(Broken)));
        let gate = AnonymizationGate::new(anonymizer, Arc::clone(&sink) as Arc<dyn AuditSink>);

        let err = gate
            .authorize_for_external_call(&record("Ana Lopez did well."))
            .unwrap_err();

        assert!(matches!(err, FerpaError::DetectionBackend { .. }));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record_id, "rec-1");
        assert_eq!(entries[0].outcome, AuditOutcome::VerificationFailed);
        assert_eq!(entries[0].placeholder_count, 0);
    }

    #[test]
    fn test_verification_failure_fails_closed() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gate = gate(Arc::clone(&sink)).with_verifier(Arc::new(Broken));

        let err = gate
            .authorize_for_external_call(&record("Good work."))
            .unwrap_err();
        assert!(matches!(err, FerpaError::GateViolation { .. }));
        assert_eq!(sink.entries()[0].outcome, AuditOutcome::VerificationFailed);
    }

    #[test]
    fn test_residual_partial_overlap_counts() {
        let spans = vec![EntitySpan::new(
            10,
            22,
            EntityType::Person,
            0.8,
            DetectionMethod::Ner,
        )];
        let placeholders = vec![(0, 16)];
        assert_eq!(residual_spans(&spans, &placeholders, &placeholders).len(), 1);
    }

    #[test]
    fn test_residual_inside_unmapped_placeholder_counts() {
        let spans = vec![EntitySpan::new(1, 8, EntityType::Person, 0.8, DetectionMethod::Ner)];
        let placeholders = vec![(0, 16)];
        assert_eq!(residual_spans(&spans, &[], &placeholders).len(), 1);
        assert!(residual_spans(&spans, &placeholders, &placeholders).is_empty());
    }

    #[test]
    fn test_policy_always_on() {
        let sink = Arc::new(MemoryAuditSink::new());
        assert!(gate(sink).policy().is_enabled());
    }
}
