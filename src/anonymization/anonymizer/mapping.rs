//! Per-record placeholder mapping
//!
//! The mapping is the only route from placeholders back to PII. It is built
//! once by the anonymizer, handed to the local persistence collaborator as
//! plain data, and never placed in an external payload.

use crate::anonymization::models::EntityType;
use crate::domain::pii::{pii_string, PiiString};
use crate::domain::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One placeholder and the original text it replaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    placeholder: String,
    entity_type: EntityType,
    original: PiiString,
}

impl MappingEntry {
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Original PII, behind `expose_secret()`
    pub fn original(&self) -> &PiiString {
        &self.original
    }
}

/// Placeholder -> original mapping for one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderMapping {
    record_id: RecordId,
    entries: Vec<MappingEntry>,
    /// Placeholder-shaped tokens already present in the input text
    #[serde(default)]
    reserved: BTreeSet<String>,
}

impl PlaceholderMapping {
    /// Empty mapping for a record
    pub fn new(record_id: RecordId) -> Self {
        Self {
            record_id,
            entries: Vec::new(),
            reserved: BTreeSet::new(),
        }
    }

    pub(crate) fn with_reserved(mut self, reserved: BTreeSet<String>) -> Self {
        self.reserved = reserved;
        self
    }

    pub(crate) fn push(&mut self, placeholder: String, entity_type: EntityType, original: &str) {
        self.entries.push(MappingEntry {
            placeholder,
            entity_type,
            original: pii_string(original),
        });
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// Entries in order of first occurrence
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Entry for a placeholder token
    pub fn get(&self, placeholder: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.placeholder == placeholder)
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.get(placeholder).is_some()
    }

    /// Placeholder tokens that passed through from the input unchanged
    pub fn reserved_tokens(&self) -> &BTreeSet<String> {
        &self.reserved
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of placeholders per entity type
    pub fn counts_by_type(&self) -> BTreeMap<EntityType, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.entity_type).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn mapping() -> PlaceholderMapping {
        let mut mapping = PlaceholderMapping::new(RecordId::new("rec-1").unwrap());
        mapping.push("[STUDENT_NAME_1]".to_string(), EntityType::StudentName, "Ana Lopez");
        mapping.push("[EMAIL_1]".to_string(), EntityType::Email, "ana@example.com");
        mapping
    }

    #[test]
    fn test_lookup() {
        let mapping = mapping();
        assert_eq!(mapping.len(), 2);
        let entry = mapping.get("[EMAIL_1]").unwrap();
        assert_eq!(entry.entity_type(), EntityType::Email);
        assert_eq!(entry.original().expose_secret().as_str(), "ana@example.com");
        assert!(!mapping.contains("[EMAIL_2]"));
    }

    #[test]
    fn test_debug_does_not_leak_originals() {
        let debug = format!("{:?}", mapping());
        assert!(!debug.contains("Ana Lopez"));
        assert!(!debug.contains("ana@example.com"));
        assert!(debug.contains("[STUDENT_NAME_1]"));
    }

    #[test]
    fn test_counts_by_type() {
        let counts = mapping().counts_by_type();
        assert_eq!(counts.get(&EntityType::StudentName), Some(&1));
        assert_eq!(counts.get(&EntityType::Email), Some(&1));
    }

    #[test]
    fn test_serde_for_local_persistence() {
        let json = serde_json::to_string(&mapping()).unwrap();
        let restored: PlaceholderMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.record_id().as_str(), "rec-1");
        assert_eq!(restored.len(), 2);
    }
}
