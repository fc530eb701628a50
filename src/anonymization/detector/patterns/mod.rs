//! Pattern library for entity detection

use crate::anonymization::models::EntityType;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this entry
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity type label
    pub category: String,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Name of the library entry the pattern came from
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// Entity type
    pub entity_type: EntityType,
    /// Confidence score
    pub confidence: f32,
}

/// Pattern library container
///
/// Entries are kept sorted by name so compilation order is stable.
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Registry of compiled entity patterns
#[derive(Debug)]
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();
        let mut patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>> = HashMap::new();

        for (name, def) in library.patterns {
            let entity_type = Self::parse_entity_type(&def.category).with_context(|| {
                format!("Invalid category in pattern '{}': {}", name, def.category)
            })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                anyhow::bail!(
                    "Confidence for pattern '{}' must be between 0.0 and 1.0, got {}",
                    name,
                    def.confidence
                );
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str)
                    .with_context(|| format!("Invalid regex in pattern '{name}': {pattern_str}"))?;

                let compiled = CompiledPattern {
                    name: name.clone(),
                    regex,
                    entity_type,
                    confidence: def.confidence,
                };

                patterns.push(compiled.clone());
                patterns_by_type
                    .entry(entity_type)
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_type,
        })
    }

    /// Create the default registry from the embedded educational pattern library
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/educational_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific entity type
    pub fn patterns_for_type(&self, entity_type: EntityType) -> Option<&[CompiledPattern]> {
        self.patterns_by_type
            .get(&entity_type)
            .map(|v| v.as_slice())
    }

    fn parse_entity_type(s: &str) -> Result<EntityType> {
        EntityType::from_label(s).ok_or_else(|| anyhow::anyhow!("Unknown entity type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.all_patterns().is_empty());
        for ty in [
            EntityType::Email,
            EntityType::Phone,
            EntityType::Ssn,
            EntityType::StudentId,
            EntityType::GradeLevel,
            EntityType::School,
        ] {
            assert!(registry.patterns_for_type(ty).is_some(), "missing {ty}");
        }
    }

    #[test]
    fn test_email_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let email = registry.patterns_for_type(EntityType::Email).unwrap();
        assert!(email[0].regex.is_match("parent@example.org"));
        assert!(!email[0].regex.is_match("not-an-email"));
    }

    #[test]
    fn test_student_id_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let ids = registry.patterns_for_type(EntityType::StudentId).unwrap();
        let matches = |text: &str| ids.iter().any(|p| p.regex.is_match(text));

        assert!(matches("Student ID: 12345678"));
        assert!(matches("submitted as S1234567"));
        assert!(matches("ref 4417820"));
        assert!(!matches("scored 95 on the quiz"));
    }

    #[test]
    fn test_grade_level_and_school_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let grade = registry.patterns_for_type(EntityType::GradeLevel).unwrap();
        let school = registry.patterns_for_type(EntityType::School).unwrap();

        assert!(grade.iter().any(|p| p.regex.is_match("a strong 10th grade writer")));
        assert!(grade.iter().any(|p| p.regex.is_match("as a sophomore")));
        assert!(school.iter().any(|p| p.regex.is_match("transferred from Lincoln High School")));
        assert!(school.iter().any(|p| p.regex.is_match("at Westbrook Academy")));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let toml = r#"
[patterns.bogus]
category = "BLOOD_TYPE"
confidence = 0.5
patterns = ['\bAB\b']
"#;
        let err = PatternRegistry::from_toml(toml).unwrap_err();
        assert!(format!("{err:#}").contains("BLOOD_TYPE"));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let toml = r#"
[patterns.email]
category = "EMAIL"
confidence = 1.5
patterns = ['@']
"#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
