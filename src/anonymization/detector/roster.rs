//! Roster-name entity detector
//!
//! Matches every known name variant of every rostered student, plus the
//! nickname expansions of their first names, as whole words and without
//! regard to case.

use super::EntityDetector;
use crate::anonymization::models::{DetectionMethod, EntitySpan, EntityType};
use crate::domain::ClassRoster;
use crate::names::NicknameTable;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashSet};

/// Confidence assigned to roster matches
pub const ROSTER_MATCH_CONFIDENCE: f32 = 0.99;

/// Common English words that are also names; skipped when written in lowercase
pub const DEFAULT_COMMON_WORD_EXCLUSIONS: &[&str] = &[
    "will", "bill", "bob", "rob", "pat", "art", "ray", "joy", "may", "mark", "nick", "jack",
    "dick", "frank", "grace", "hope", "faith", "gene", "jean", "sue", "dawn", "don", "drew",
    "dean", "grant", "wade", "chase", "chance", "clay", "cliff", "dale", "glen", "lane", "miles",
    "pierce", "reed", "sterling", "troy", "ward",
];

struct RosterPattern {
    regex: Regex,
}

/// Detector for names of rostered students
pub struct RosterDetector {
    patterns: Vec<RosterPattern>,
    exclusions: HashSet<String>,
}

impl RosterDetector {
    /// Build patterns for every student on the roster
    pub fn new(roster: &ClassRoster, nicknames: &NicknameTable) -> Result<Self> {
        let mut variants: BTreeSet<String> = BTreeSet::new();

        for student in &roster.students {
            let explicit = student.all_name_variants();
            let explicit_lower: HashSet<String> =
                explicit.iter().map(|v| v.to_lowercase()).collect();
            variants.extend(explicit);

            let last = student.last_name.as_str();
            let first = student.first_name.as_str();
            let expansions = nicknames
                .aliases_of(first)
                .iter()
                .chain(nicknames.canonical_forms(first));

            for expanded in expansions {
                if explicit_lower.contains(expanded) {
                    continue;
                }
                let display = capitalize(expanded);
                variants.insert(format!("{display} {last}"));
                variants.insert(display);
            }
        }

        let mut patterns = Vec::new();
        // Longest variants first so "Mary O'Brien" is found before "Mary".
        let mut ordered: Vec<String> = variants
            .into_iter()
            .filter(|v| v.trim().chars().count() >= 2)
            .collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        for variant in ordered {
            let pattern = format!(r"\b{}\b", regex::escape(variant.trim()));
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .context("Failed to compile roster name pattern")?;
            patterns.push(RosterPattern { regex });
        }

        Ok(Self {
            patterns,
            exclusions: DEFAULT_COMMON_WORD_EXCLUSIONS
                .iter()
                .map(|w| w.to_string())
                .collect(),
        })
    }

    /// Replace the common-word exclusion list
    pub fn with_exclusions<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusions = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Number of compiled name patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    fn is_common_word_usage(&self, matched: &str) -> bool {
        let lower = matched.to_lowercase();
        self.exclusions.contains(&lower) && matched == lower
    }
}

impl EntityDetector for RosterDetector {
    fn name(&self) -> &str {
        "roster"
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut spans = Vec::new();
        for pattern in &self.patterns {
            for matched in pattern.regex.find_iter(text) {
                if self.is_common_word_usage(matched.as_str()) {
                    continue;
                }
                spans.push(EntitySpan::new(
                    matched.start(),
                    matched.end(),
                    EntityType::StudentName,
                    ROSTER_MATCH_CONFIDENCE,
                    DetectionMethod::Roster,
                ));
            }
        }
        Ok(spans)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::detector::dedup_by_containment;
    use crate::domain::{RosterEntry, StudentId};

    fn roster() -> ClassRoster {
        ClassRoster::new(
            "class-1",
            vec![
                RosterEntry::new(StudentId::new("S1").unwrap(), "William", "Turner"),
                RosterEntry::new(StudentId::new("S2").unwrap(), "Mary", "O'Brien"),
            ],
        )
    }

    fn detector() -> RosterDetector {
        RosterDetector::new(&roster(), &NicknameTable::default_table().unwrap()).unwrap()
    }

    fn matched<'a>(text: &'a str, spans: &[EntitySpan]) -> Vec<&'a str> {
        spans.iter().map(|s| &text[s.start..s.end]).collect()
    }

    #[test]
    fn test_detects_full_and_partial_names() {
        let text = "William Turner helped Mary with the lab. Turner, William led.";
        let spans = dedup_by_containment(detector().detect(text).unwrap());
        let found = matched(text, &spans);
        assert!(found.contains(&"William Turner"));
        assert!(found.contains(&"Mary"));
        assert!(found.contains(&"Turner, William"));
        assert!(spans.iter().all(|s| s.entity_type == EntityType::StudentName));
    }

    #[test]
    fn test_case_insensitive_and_apostrophes() {
        let text = "MARY O'BRIEN presented.";
        let spans = dedup_by_containment(detector().detect(text).unwrap());
        assert_eq!(matched(text, &spans), vec!["MARY O'BRIEN"]);
    }

    #[test]
    fn test_nickname_expansion() {
        let text = "Bill was focused today.";
        let spans = detector().detect(text).unwrap();
        assert_eq!(matched(text, &spans), vec!["Bill"]);
    }

    #[test]
    fn test_lowercase_common_word_skipped() {
        let text = "He will improve. Will did improve.";
        let spans = detector().detect(text).unwrap();
        let found = matched(text, &spans);
        assert_eq!(found, vec!["Will"]);
    }

    #[test]
    fn test_word_boundaries() {
        let text = "Marylin and Williamsburg are unrelated.";
        assert!(detector().detect(text).unwrap().is_empty());
    }

    #[test]
    fn test_empty_roster() {
        let detector =
            RosterDetector::new(&ClassRoster::default(), &NicknameTable::empty()).unwrap();
        assert_eq!(detector.pattern_count(), 0);
        assert!(detector.detect("Anyone at all").unwrap().is_empty());
    }
}
