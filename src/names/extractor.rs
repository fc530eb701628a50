//! Name extraction backends
//!
//! A [`NameExtractor`] is a pure function from comment text to candidate
//! person names. Backends are selected by configuration; [`FallbackExtractor`]
//! pairs a primary with a secondary and [`LazyExtractor`] defers building an
//! expensive backend until first use.

use super::matcher::ExtractedName;
use super::NicknameTable;
use crate::anonymization::detector::{EntityDetector, RosterDetector};
use crate::core::shared::SharedBackend;
use crate::domain::ClassRoster;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// Capability interface for name extraction backends
pub trait NameExtractor: Send + Sync {
    /// Backend name, recorded as the extraction method
    fn name(&self) -> &str;

    /// Candidate names in order of appearance
    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>>;
}

impl<T: NameExtractor + ?Sized> NameExtractor for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        (**self).extract_names(text)
    }
}

impl<T: NameExtractor + ?Sized> NameExtractor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        (**self).extract_names(text)
    }
}

/// Extractor backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Roster variants and nicknames
    #[default]
    Roster,
    /// Capitalized-word heuristic
    Capitalized,
}

impl ExtractorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Roster => "roster",
            Self::Capitalized => "capitalized",
        }
    }
}

/// Finds rostered names (and their nicknames) in text
pub struct RosterExtractor {
    detector: RosterDetector,
}

impl RosterExtractor {
    pub fn new(roster: &ClassRoster, nicknames: &NicknameTable) -> Result<Self> {
        Ok(Self {
            detector: RosterDetector::new(roster, nicknames)?,
        })
    }

    pub fn with_exclusions<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.detector = self.detector.with_exclusions(words);
        self
    }
}

impl NameExtractor for RosterExtractor {
    fn name(&self) -> &str {
        ExtractorKind::Roster.label()
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        let mut spans = self.detector.detect(text)?;
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut seen = HashSet::new();
        let mut covered_until = 0;
        let mut names = Vec::new();
        for span in spans {
            if span.start < covered_until {
                continue;
            }
            covered_until = span.end;
            let surface = &text[span.start..span.end];
            if seen.insert(surface.to_lowercase()) {
                names.push(ExtractedName::new(surface, f64::from(span.score)));
            }
        }
        Ok(names)
    }
}

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][A-Za-z]*(?:['\u{2019}-][A-Z]?[A-Za-z]+)*(?:\s+[A-Z][A-Za-z]*(?:['\u{2019}-][A-Z]?[A-Za-z]+)*){0,2}",
    )
    .expect("capitalized-name pattern is a valid regex")
});

const NOT_NAMES: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "for", "from", "he", "her", "his", "i", "if", "in", "it",
    "its", "she", "so", "that", "the", "their", "them", "then", "there", "they", "this", "to",
    "we", "when", "while", "with", "you", "your", "great", "good", "excellent", "overall",
    "nice", "thanks", "thank", "well", "also", "wonderful", "outstanding", "congratulations",
    "keep", "please", "student", "students", "class", "term", "semester", "quarter", "grade",
    "math", "english", "science", "history", "art", "music", "reading", "writing", "spanish",
    "french", "monday", "tuesday", "wednesday", "thursday", "friday", "january", "february",
    "march", "april", "june", "july", "august", "september", "october", "november",
    "december", "mr", "mrs", "ms", "dr",
];

/// Capitalized-word heuristic
///
/// Runs of one to three capitalized words, with common sentence openers and
/// subject words trimmed from the front. Useful without a roster.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapitalizedNameExtractor;

impl CapitalizedNameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl NameExtractor for CapitalizedNameExtractor {
    fn name(&self) -> &str {
        ExtractorKind::Capitalized.label()
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();

        for matched in CAPITALIZED_RUN.find_iter(text) {
            let words: Vec<&str> = matched
                .as_str()
                .split_whitespace()
                .skip_while(|w| NOT_NAMES.contains(&w.to_lowercase().as_str()))
                .take_while(|w| !NOT_NAMES.contains(&w.to_lowercase().as_str()))
                .collect();
            if words.is_empty() || words.iter().all(|w| w.len() < 2) {
                continue;
            }

            let candidate = words.join(" ");
            if seen.insert(candidate.to_lowercase()) {
                let confidence = if words.len() > 1 { 0.6 } else { 0.4 };
                names.push(ExtractedName::new(candidate, confidence));
            }
        }
        Ok(names)
    }
}

/// Primary backend with a secondary fallback
///
/// Falls back when the primary errors, or returns nothing for non-empty
/// text. Falling back is logged and never raised; only a failing secondary
/// is reported to the caller.
pub struct FallbackExtractor {
    primary: Arc<dyn NameExtractor>,
    secondary: Arc<dyn NameExtractor>,
    label: String,
}

impl FallbackExtractor {
    pub fn new(primary: Arc<dyn NameExtractor>, secondary: Arc<dyn NameExtractor>) -> Self {
        let label = format!("{}+{}", primary.name(), secondary.name());
        Self {
            primary,
            secondary,
            label,
        }
    }
}

impl NameExtractor for FallbackExtractor {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        match self.primary.extract_names(text) {
            Ok(names) if !names.is_empty() || text.trim().is_empty() => return Ok(names),
            Ok(_) => {
                tracing::debug!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    "Primary extractor found no names, using fallback"
                );
            }
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    error = %e,
                    "Primary extractor failed, using fallback"
                );
            }
        }
        self.secondary.extract_names(text)
    }
}

/// Extractor built on first use and shared afterwards
pub struct LazyExtractor {
    name: String,
    backend: SharedBackend<Box<dyn NameExtractor>>,
}

impl LazyExtractor {
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Result<Box<dyn NameExtractor>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            backend: SharedBackend::new(init),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_initialized()
    }
}

impl NameExtractor for LazyExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract_names(&self, text: &str) -> Result<Vec<ExtractedName>> {
        self.backend.get()?.extract_names(text)
    }
}
