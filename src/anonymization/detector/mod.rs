//! Entity detection module
//!
//! Provides the trait-based detection interface and the backends that find
//! PII spans in comment text. Detection is a pure function of the text and
//! the detector's configuration: the same input always yields the same
//! spans in the same order.

pub mod patterns;
pub mod regex;
pub mod roster;

pub use patterns::PatternRegistry;
pub use regex::RegexDetector;
pub use roster::RosterDetector;

use crate::anonymization::models::EntitySpan;
use crate::core::shared::SharedBackend;
use anyhow::Result;
use std::sync::Arc;

/// Trait for entity detection backends
pub trait EntityDetector: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Detect entity spans in text
    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

impl<T: EntityDetector + ?Sized> EntityDetector for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        (**self).detect(text)
    }
}

impl<T: EntityDetector + ?Sized> EntityDetector for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        (**self).detect(text)
    }
}

/// Combines several backends behind one minimum-score threshold
///
/// Output spans are filtered by score, deduplicated by containment and
/// sorted by offset.
pub struct CompositeDetector {
    backends: Vec<Arc<dyn EntityDetector>>,
    score_threshold: f32,
}

impl CompositeDetector {
    /// Recall-biased default threshold
    pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            score_threshold: Self::DEFAULT_SCORE_THRESHOLD,
        }
    }

    /// Register a backend
    pub fn with_backend(mut self, backend: Arc<dyn EntityDetector>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Set the minimum score threshold
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }
}

impl Default for CompositeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityDetector for CompositeDetector {
    fn name(&self) -> &str {
        "composite"
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut spans = Vec::new();
        for backend in &self.backends {
            let found = backend.detect(text).map_err(|e| {
                e.context(format!("detector backend '{}' failed", backend.name()))
            })?;
            spans.extend(
                found
                    .into_iter()
                    .filter(|s| s.score >= self.score_threshold && !s.is_empty()),
            );
        }
        Ok(dedup_by_containment(spans))
    }
}

/// Lazily initialized detector backend
///
/// The wrapped backend is built on first use, exactly once, and shared
/// read-only afterwards. A failed initialization is reported as a detection
/// failure and retried on the next call.
pub struct LazyDetector {
    name: String,
    backend: SharedBackend<Box<dyn EntityDetector>>,
}

impl LazyDetector {
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Result<Box<dyn EntityDetector>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            backend: SharedBackend::new(init),
        }
    }

    /// Whether the backend has been initialized
    pub fn is_initialized(&self) -> bool {
        self.backend.is_initialized()
    }
}

impl EntityDetector for LazyDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, text: &str) -> Result<Vec<EntitySpan>> {
        self.backend.get()?.detect(text)
    }
}

/// Drop spans fully contained in a larger span
///
/// The larger span always survives. When the contained span scored higher,
/// the survivor takes over its type and score. Partially overlapping spans
/// are all kept; the anonymizer merges them.
pub fn dedup_by_containment(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(b.score.total_cmp(&a.score))
            .then(a.entity_type.cmp(&b.entity_type))
    });

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    'outer: for span in spans {
        for container in kept.iter_mut().rev() {
            if container.contains(&span) {
                if span.score > container.score {
                    container.entity_type = span.entity_type;
                    container.score = span.score;
                    container.method = span.method;
                }
                continue 'outer;
            }
        }
        kept.push(span);
    }
    kept
}
