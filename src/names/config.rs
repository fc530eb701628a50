//! Name verification configuration (`[names]`)

use super::extractor::{
    CapitalizedNameExtractor, ExtractorKind, FallbackExtractor, NameExtractor, RosterExtractor,
};
use super::matcher::{NameMatcher, DEFAULT_SIMILARITY_THRESHOLD};
use super::NicknameTable;
use crate::core::pipeline::ConfidenceThresholds;
use crate::domain::ClassRoster;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    /// Minimum similarity (0-100) for an extracted name to count as a match
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Nickname table TOML file; the embedded table is used when unset
    #[serde(default)]
    pub nickname_table: Option<PathBuf>,

    /// Primary extraction backend
    #[serde(default)]
    pub extractor: ExtractorKind,

    /// Backend used when the primary fails or finds nothing
    #[serde(default = "default_fallback")]
    pub fallback: Option<ExtractorKind>,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            nickname_table: None,
            extractor: ExtractorKind::default(),
            fallback: default_fallback(),
        }
    }
}

impl NamesConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "names.similarity_threshold must be between 0 and 100, got {}",
                self.similarity_threshold
            ));
        }

        if let Some(ref path) = self.nickname_table {
            if !path.exists() {
                return Err(format!("Nickname table not found: {}", path.display()));
            }
        }

        if self.fallback == Some(self.extractor) {
            return Err(format!(
                "names.fallback must differ from names.extractor ('{}')",
                self.extractor.label()
            ));
        }

        Ok(())
    }

    /// Load the configured nickname table
    pub fn load_nicknames(&self) -> Result<NicknameTable> {
        match self.nickname_table {
            Some(ref path) => NicknameTable::from_file(path),
            None => NicknameTable::default_table(),
        }
    }

    pub fn build_matcher(
        &self,
        nicknames: Arc<NicknameTable>,
        thresholds: ConfidenceThresholds,
    ) -> NameMatcher {
        NameMatcher::new(nicknames)
            .with_similarity_threshold(self.similarity_threshold)
            .with_thresholds(thresholds)
    }

    /// Build the extractor chain
    ///
    /// The roster backend needs a roster; without one it is replaced by the
    /// capitalized-word heuristic.
    pub fn build_extractor(
        &self,
        roster: Option<&ClassRoster>,
        nicknames: &NicknameTable,
        exclusions: &[String],
    ) -> Result<Arc<dyn NameExtractor>> {
        let primary = build_one(self.extractor, roster, nicknames, exclusions)?;
        let fallback = match self.fallback {
            Some(kind) if kind != self.extractor => {
                Some(build_one(kind, roster, nicknames, exclusions)?)
            }
            _ => None,
        };

        Ok(match fallback {
            Some(secondary) if secondary.name() != primary.name() => {
                Arc::new(FallbackExtractor::new(primary, secondary))
            }
            _ => primary,
        })
    }
}

fn build_one(
    kind: ExtractorKind,
    roster: Option<&ClassRoster>,
    nicknames: &NicknameTable,
    exclusions: &[String],
) -> Result<Arc<dyn NameExtractor>> {
    match (kind, roster) {
        (ExtractorKind::Roster, Some(roster)) => Ok(Arc::new(
            RosterExtractor::new(roster, nicknames)?.with_exclusions(exclusions),
        )),
        (ExtractorKind::Roster, None) => {
            tracing::warn!("Roster extractor selected but no roster supplied, using capitalized");
            Ok(Arc::new(CapitalizedNameExtractor::new()))
        }
        (ExtractorKind::Capitalized, _) => Ok(Arc::new(CapitalizedNameExtractor::new())),
    }
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_fallback() -> Option<ExtractorKind> {
    Some(ExtractorKind::Capitalized)
}
