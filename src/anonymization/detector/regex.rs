//! Pattern-library entity detector

use super::{patterns::PatternRegistry, EntityDetector};
use crate::anonymization::models::{DetectionMethod, EntitySpan};
use anyhow::Result;
use std::sync::Arc;

/// Regex-based entity detector
pub struct RegexDetector {
    pattern_registry: Arc<PatternRegistry>,
    confidence_threshold: f32,
}

impl RegexDetector {
    /// Create a new regex detector with the default pattern library
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a new regex detector with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
            confidence_threshold: 0.0,
        }
    }

    /// Skip patterns whose confidence is below the threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}

impl EntityDetector for RegexDetector {
    fn name(&self) -> &str {
        "regex"
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut spans = Vec::new();

        for pattern in self.pattern_registry.all_patterns() {
            if pattern.confidence < self.confidence_threshold {
                continue;
            }

            for matched in pattern.regex.find_iter(text) {
                spans.push(EntitySpan::new(
                    matched.start(),
                    matched.end(),
                    pattern.entity_type,
                    pattern.confidence,
                    DetectionMethod::Regex,
                ));
            }
        }

        Ok(spans)
    }
}
