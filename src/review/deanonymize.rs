//! Restoring anonymized text for authorized local review
//!
//! This is the only path from placeholders back to original PII. It runs
//! on the trusted side of the boundary and has no network-capable
//! dependencies.

use crate::anonymization::anonymizer::placeholder_regex;
use crate::anonymization::PlaceholderMapping;
use crate::domain::{MappingIntegrityError, Record};
use secrecy::ExposeSecret;

/// Replace every placeholder in `text` with its original value
///
/// Placeholder-shaped tokens that were already present in the input text
/// (reserved tokens) are passed through unchanged.
///
/// # Errors
///
/// - [`MappingIntegrityError::UnknownPlaceholder`] when the text holds a
///   placeholder the mapping does not know
/// - [`MappingIntegrityError::MissingPlaceholder`] when a mapped placeholder
///   no longer occurs in the text
pub fn deanonymize(
    text: &str,
    mapping: &PlaceholderMapping,
) -> Result<String, MappingIntegrityError> {
    for entry in mapping.entries() {
        if !text.contains(entry.placeholder()) {
            return Err(MappingIntegrityError::MissingPlaceholder {
                placeholder: entry.placeholder().to_string(),
            });
        }
    }

    let mut restored = String::with_capacity(text.len());
    let mut last = 0;
    for token in placeholder_regex().find_iter(text) {
        restored.push_str(&text[last..token.start()]);
        match mapping.get(token.as_str()) {
            Some(entry) => restored.push_str(entry.original().expose_secret().as_str()),
            None if mapping.reserved_tokens().contains(token.as_str()) => {
                restored.push_str(token.as_str())
            }
            None => {
                return Err(MappingIntegrityError::UnknownPlaceholder {
                    placeholder: token.as_str().to_string(),
                })
            }
        }
        last = token.end();
    }
    restored.push_str(&text[last..]);

    Ok(restored)
}

/// Restores records for the review step
#[derive(Debug, Default, Clone, Copy)]
pub struct DeAnonymizer;

impl DeAnonymizer {
    pub fn new() -> Self {
        Self
    }

    /// Original text of a processed record
    ///
    /// A record that never reached anonymization still holds only its raw
    /// text, which is returned as is.
    ///
    /// # Errors
    ///
    /// [`MappingIntegrityError::MissingMapping`] when anonymized text has no
    /// mapping, [`MappingIntegrityError::RecordMismatch`] when the mapping
    /// belongs to another record, and any error from [`deanonymize`].
    pub fn restore(&self, record: &Record) -> Result<String, MappingIntegrityError> {
        let Some(anonymized) = record.anonymized_text() else {
            return Ok(record.text().to_string());
        };
        let mapping = record
            .mapping()
            .ok_or_else(|| MappingIntegrityError::MissingMapping {
                record_id: record.id().to_string(),
            })?;
        self.restore_with(record, anonymized, mapping)
    }

    /// Restore `text` (for example a reviewer-edited version) using the
    /// record's own mapping
    pub fn restore_with(
        &self,
        record: &Record,
        text: &str,
        mapping: &PlaceholderMapping,
    ) -> Result<String, MappingIntegrityError> {
        if mapping.record_id() != record.id() {
            tracing::warn!(
                record_id = %record.id(),
                mapping_record_id = %mapping.record_id(),
                "De-anonymization refused: mapping belongs to another record"
            );
            return Err(MappingIntegrityError::RecordMismatch {
                expected: record.id().to_string(),
                actual: mapping.record_id().to_string(),
            });
        }

        let restored = deanonymize(text, mapping)?;
        tracing::debug!(
            record_id = %record.id(),
            placeholders = mapping.len(),
            "Record restored for review"
        );
        Ok(restored)
    }
}
