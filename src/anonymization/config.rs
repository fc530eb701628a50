//! Anonymization configuration
//!
//! The `[detection]` and `[ferpa]` sections of the configuration file, and
//! the constructors that turn them into a detector stack and an audit sink.

use crate::anonymization::audit::{AuditLogger, AuditSink, NullAuditSink};
use crate::anonymization::compliance::AnonymizeBeforeApi;
use crate::anonymization::detector::roster::DEFAULT_COMMON_WORD_EXCLUSIONS;
use crate::anonymization::detector::{
    CompositeDetector, PatternRegistry, RegexDetector, RosterDetector,
};
use crate::domain::ClassRoster;
use crate::names::NicknameTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Entity detection settings (`[detection]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum detector score for a span to be kept (0.0 - 1.0)
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Path to a pattern library TOML file; the embedded library is used when unset
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Match roster names in addition to patterns
    #[serde(default = "default_true")]
    pub use_roster: bool,

    /// Lowercase words that are not treated as names when written in lowercase
    #[serde(default = "default_common_word_exclusions")]
    pub common_word_exclusions: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            pattern_library: None,
            use_roster: true,
            common_word_exclusions: default_common_word_exclusions(),
        }
    }
}

impl DetectionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(format!(
                "detection.score_threshold must be between 0.0 and 1.0, got {}",
                self.score_threshold
            ));
        }

        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                return Err(format!(
                    "Pattern library file not found: {}",
                    path.display()
                ));
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(format!(
                    "Pattern library must be a TOML file: {}",
                    path.display()
                ));
            }
        }

        Ok(())
    }

    /// Build the detector stack for a batch
    ///
    /// Pattern detection is always present; roster matching is added when
    /// enabled and a roster is supplied.
    pub fn build_detector(
        &self,
        roster: Option<&ClassRoster>,
        nicknames: &NicknameTable,
    ) -> Result<CompositeDetector> {
        let registry = match self.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_patterns()?,
        };
        let regex = RegexDetector::with_registry(registry)
            .with_confidence_threshold(self.score_threshold);

        let mut detector = CompositeDetector::new()
            .with_score_threshold(self.score_threshold)
            .with_backend(Arc::new(regex));

        if let (true, Some(roster)) = (self.use_roster, roster) {
            let roster_detector = RosterDetector::new(roster, nicknames)
                .context("Failed to build roster detector")?
                .with_exclusions(&self.common_word_exclusions);
            tracing::debug!(
                class_id = %roster.class_id,
                patterns = roster_detector.pattern_count(),
                "Roster detector ready"
            );
            detector = detector.with_backend(Arc::new(roster_detector));
        }

        Ok(detector)
    }
}

/// FERPA compliance settings (`[ferpa]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerpaConfig {
    /// Always true; `false` is rejected when the file is parsed
    #[serde(default)]
    pub anonymize_before_api: AnonymizeBeforeApi,

    /// Write gate decisions to the audit log
    #[serde(default = "default_true")]
    pub audit_enabled: bool,

    /// Audit log file path (JSON Lines)
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,
}

impl Default for FerpaConfig {
    fn default() -> Self {
        Self {
            anonymize_before_api: AnonymizeBeforeApi,
            audit_enabled: true,
            audit_log_path: default_audit_log_path(),
        }
    }
}

impl FerpaConfig {
    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.audit_enabled && self.audit_log_path.as_os_str().is_empty() {
            return Err("ferpa.audit_log_path must be set when auditing is enabled".to_string());
        }
        Ok(())
    }

    /// Open the configured audit sink
    pub fn audit_sink(&self) -> Result<Arc<dyn AuditSink>> {
        if self.audit_enabled {
            Ok(Arc::new(AuditLogger::new(&self.audit_log_path)?))
        } else {
            tracing::warn!("Audit logging is disabled; gate decisions will not be recorded");
            Ok(Arc::new(NullAuditSink))
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_score_threshold() -> f32 {
    CompositeDetector::DEFAULT_SCORE_THRESHOLD
}

fn default_common_word_exclusions() -> Vec<String> {
    DEFAULT_COMMON_WORD_EXCLUSIONS
        .iter()
        .map(|w| w.to_string())
        .collect()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/gate.jsonl")
}
