//! Anonymizer
//!
//! Replaces detected entity spans with typed, numbered placeholders and
//! records a per-record [`PlaceholderMapping`].
//!
//! Replacement runs right-to-left by offset so earlier offsets stay valid.
//! A span that covers exactly a placeholder already present in the input
//! is ignored, which makes the operation idempotent: anonymizing anonymized
//! text returns it unchanged with an empty mapping. Spans inside such a
//! token, or inside a bracketed token with an unknown label, are replaced
//! like any other span.

pub mod mapping;
pub mod placeholder;

pub use mapping::{MappingEntry, PlaceholderMapping};
pub use placeholder::{format_placeholder, placeholder_ranges, placeholder_regex};

use crate::anonymization::detector::{dedup_by_containment, EntityDetector};
use crate::anonymization::models::EntitySpan;
use crate::domain::{Record, RecordId};
use anyhow::Result;
use placeholder::PlaceholderAllocator;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Result of anonymizing one text
#[derive(Debug, Clone)]
pub struct Anonymized {
    /// Text with every span replaced by its placeholder
    pub text: String,
    /// Placeholder mapping for the record
    pub mapping: PlaceholderMapping,
    /// Spans that were replaced, in offsets of the input text
    pub spans: Vec<EntitySpan>,
}

/// Deterministic span-to-placeholder replacement
pub struct Anonymizer {
    detector: Arc<dyn EntityDetector>,
}

impl Anonymizer {
    /// Create an anonymizer over a detector
    pub fn new(detector: Arc<dyn EntityDetector>) -> Self {
        Self { detector }
    }

    /// The detector this anonymizer runs
    pub fn detector(&self) -> &Arc<dyn EntityDetector> {
        &self.detector
    }

    /// Anonymize a record's raw text
    pub fn anonymize(&self, record: &Record) -> Result<Anonymized> {
        self.anonymize_text(record.id(), record.text())
    }

    /// Detect spans in `text` and replace them
    pub fn anonymize_text(&self, record_id: &RecordId, text: &str) -> Result<Anonymized> {
        let spans = self.detector.detect(text)?;
        apply_spans(record_id, text, spans)
    }
}

/// Replace the given spans in `text` with placeholders
///
/// Spans are deduplicated by containment, partial overlaps are merged into
/// their union (typed by the higher-scoring span), and spans that exactly
/// cover a pre-existing placeholder are dropped. Offsets must fall on
/// character boundaries within `text`.
pub fn apply_spans(record_id: &RecordId, text: &str, spans: Vec<EntitySpan>) -> Result<Anonymized> {
    for span in &spans {
        if span.start > span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            anyhow::bail!(
                "detector produced an invalid span {}..{} for record {}",
                span.start,
                span.end,
                record_id
            );
        }
    }

    let existing = placeholder_ranges(text);
    let reserved: BTreeSet<String> = existing
        .iter()
        .map(|(start, end)| text[*start..*end].to_string())
        .collect();

    let spans: Vec<EntitySpan> = spans
        .into_iter()
        .filter(|s| !s.is_empty())
        .filter(|s| !existing.iter().any(|(ps, pe)| *ps == s.start && s.end == *pe))
        .collect();
    let spans = merge_overlaps(dedup_by_containment(spans));

    let mut allocator = PlaceholderAllocator::new(reserved.clone());
    let mut mapping = PlaceholderMapping::new(record_id.clone()).with_reserved(reserved);
    let mut tokens = Vec::with_capacity(spans.len());

    for span in &spans {
        let surface = &text[span.start..span.end];
        let (token, is_new) = allocator.placeholder_for(span.entity_type, surface);
        if is_new {
            mapping.push(token.clone(), span.entity_type, surface);
        }
        tokens.push(token);
    }

    let mut result = text.to_string();
    for (span, token) in spans.iter().zip(tokens.iter()).rev() {
        result.replace_range(span.start..span.end, token);
    }

    Ok(Anonymized {
        text: result,
        mapping,
        spans,
    })
}

/// Merge partially overlapping spans into their union
///
/// Input must be sorted by start with no containment (the output of
/// [`dedup_by_containment`]).
fn merge_overlaps(spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    let mut merged: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.overlaps(&span) => {
                last.end = last.end.max(span.end);
                if span.score > last.score {
                    last.entity_type = span.entity_type;
                    last.score = span.score;
                    last.method = span.method;
                }
            }
            _ => merged.push(span),
        }
    }
    merged
}
