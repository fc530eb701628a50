//! Placeholder tokens
//!
//! A placeholder encodes only an entity type and a per-record sequence
//! number, e.g. `[STUDENT_NAME_2]`. Nothing derived from the original text
//! ever appears in a token.

use crate::anonymization::models::EntityType;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let labels: Vec<&str> = EntityType::ALL.iter().map(EntityType::label).collect();
    Regex::new(&format!(r"\[(?:{})_\d+\]", labels.join("|")))
        .expect("placeholder pattern is a valid regex")
});

/// Pattern matching a placeholder token of a known entity type
///
/// Bracketed tokens with any other label, such as `[JOHN_SMITH_1]`, are
/// ordinary text.
pub fn placeholder_regex() -> &'static Regex {
    &PLACEHOLDER_REGEX
}

/// Format a placeholder token
pub fn format_placeholder(entity_type: EntityType, index: usize) -> String {
    format!("[{}_{}]", entity_type.label(), index)
}

/// Byte ranges of placeholder-shaped tokens in `text`
pub fn placeholder_ranges(text: &str) -> Vec<(usize, usize)> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Allocates placeholders for one record
///
/// The same surface text of the same type always receives the same token.
/// Numbering is per type and skips tokens already present in the input.
pub struct PlaceholderAllocator {
    counters: HashMap<EntityType, usize>,
    assigned: HashMap<(EntityType, String), String>,
    reserved: BTreeSet<String>,
}

impl PlaceholderAllocator {
    /// Create an allocator that will not reuse any token in `reserved`
    pub fn new(reserved: BTreeSet<String>) -> Self {
        Self {
            counters: HashMap::new(),
            assigned: HashMap::new(),
            reserved,
        }
    }

    /// Placeholder for a surface string, and whether it was newly allocated
    pub fn placeholder_for(&mut self, entity_type: EntityType, surface: &str) -> (String, bool) {
        let key = (entity_type, surface.to_string());
        if let Some(existing) = self.assigned.get(&key) {
            return (existing.clone(), false);
        }

        let counter = self.counters.entry(entity_type).or_insert(0);
        let token = loop {
            *counter += 1;
            let candidate = format_placeholder(entity_type, *counter);
            if !self.reserved.contains(&candidate) {
                break candidate;
            }
        };

        self.assigned.insert(key, token.clone());
        (token, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_placeholder(EntityType::StudentName, 1), "[STUDENT_NAME_1]");
        assert_eq!(format_placeholder(EntityType::Ssn, 12), "[SSN_12]");
    }

    #[test]
    fn test_regex_matches_all_types() {
        for ty in [EntityType::StudentName, EntityType::GradeLevel, EntityType::Email] {
            assert!(placeholder_regex().is_match(&format_placeholder(ty, 3)));
        }
        assert!(!placeholder_regex().is_match("[draft]"));
        assert!(!placeholder_regex().is_match("[NOTE]"));
        assert!(!placeholder_regex().is_match("[JOHN_SMITH_1]"));
    }

    #[test]
    fn test_same_surface_reuses_token() {
        let mut allocator = PlaceholderAllocator::new(BTreeSet::new());
        let (first, new_first) = allocator.placeholder_for(EntityType::StudentName, "Ana");
        let (second, new_second) = allocator.placeholder_for(EntityType::StudentName, "Ana");
        let (other, _) = allocator.placeholder_for(EntityType::StudentName, "Luis");

        assert_eq!(first, second);
        assert!(new_first);
        assert!(!new_second);
        assert_eq!(other, "[STUDENT_NAME_2]");
    }

    #[test]
    fn test_numbering_is_per_type() {
        let mut allocator = PlaceholderAllocator::new(BTreeSet::new());
        allocator.placeholder_for(EntityType::StudentName, "Ana");
        let (email, _) = allocator.placeholder_for(EntityType::Email, "a@b.co");
        assert_eq!(email, "[EMAIL_1]");
    }

    #[test]
    fn test_reserved_tokens_are_skipped() {
        let reserved: BTreeSet<String> = ["[STUDENT_NAME_1]".to_string()].into_iter().collect();
        let mut allocator = PlaceholderAllocator::new(reserved);
        let (token, _) = allocator.placeholder_for(EntityType::StudentName, "Ana");
        assert_eq!(token, "[STUDENT_NAME_2]");
    }

    #[test]
    fn test_placeholder_ranges() {
        let text = "[STUDENT_NAME_1] met [SCHOOL_1].";
        assert_eq!(placeholder_ranges(text), vec![(0, 16), (21, 31)]);
    }
}
