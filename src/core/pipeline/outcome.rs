//! Batch outcome and reporting
//!
//! Counts per outcome plus a redacted error list. Error descriptors carry
//! record ids and error classes only.

use crate::domain::{Record, RecordError, RecordId, RecordState, RouteDecision};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of one orchestrator run
///
/// `processed = succeeded + failed`. `blocked_by_gate` counts routed records
/// whose external analysis the gate refused, so it is a subset of
/// `succeeded`. `cancelled` records never started.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Records that ran to a terminal state
    pub processed: usize,

    /// Records that were routed
    pub succeeded: usize,

    /// Records that ended in `FAILED`
    pub failed: usize,

    /// Routed records the gate blocked from external analysis
    pub blocked_by_gate: usize,

    /// Records not started because the run was cancelled
    pub cancelled: usize,

    pub auto_accepted: usize,
    pub needs_review: usize,
    pub auto_rejected: usize,

    /// Per-record error descriptors
    #[serde(default)]
    pub errors: Vec<RecordError>,

    /// Wall-clock duration of the run in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a record that finished processing
    pub(crate) fn record(&mut self, record: &Record) {
        match record.state() {
            RecordState::Routed(decision) => {
                self.processed += 1;
                self.succeeded += 1;
                if record.external_analysis_skipped() {
                    self.blocked_by_gate += 1;
                }
                match decision {
                    RouteDecision::AutoAccepted => self.auto_accepted += 1,
                    RouteDecision::NeedsReview => self.needs_review += 1,
                    RouteDecision::AutoRejected => self.auto_rejected += 1,
                }
            }
            RecordState::Failed => {
                self.processed += 1;
                self.failed += 1;
                let error = record.error().cloned().unwrap_or_else(|| {
                    RecordError::new(record.id().as_str(), "record failed without an error descriptor")
                });
                self.errors.push(error);
            }
            state => {
                tracing::warn!(
                    record_id = %record.id(),
                    state = %state,
                    "Record finished in a non-terminal state"
                );
            }
        }
    }

    /// Count a record that was never started
    pub(crate) fn record_cancelled(&mut self, record_id: &RecordId) {
        self.cancelled += 1;
        self.errors.push(
            RecordError::new(record_id.as_str(), "not processed: batch was cancelled")
                .with_kind("cancelled"),
        );
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Total records seen, started or not
    pub fn total(&self) -> usize {
        self.processed + self.cancelled
    }

    /// No failures, no gate blocks, nothing cancelled
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.blocked_by_gate == 0 && self.cancelled == 0
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }

    /// Routed records as a percentage of processed records
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.processed as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            blocked_by_gate = self.blocked_by_gate,
            cancelled = self.cancelled,
            auto_accepted = self.auto_accepted,
            needs_review = self.needs_review,
            auto_rejected = self.auto_rejected,
            duration_ms = self.duration_ms,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Batch completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    record_id = %error.record_id,
                    kind = %error.kind,
                    stage = error.stage.as_deref().unwrap_or("-"),
                    "Record error"
                );
            }
        }
    }
}
