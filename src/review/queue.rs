//! Human review queue
//!
//! Holds routed records that need a person to look at them, together with
//! their restored text. Items are ordered by record id.

use super::deanonymize::DeAnonymizer;
use crate::domain::pii::{pii_string, PiiString};
use crate::domain::{FerpaError, Record, Result, ReviewStatus, RouteDecision};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A routed record queued for review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub record: Record,

    /// Restored text for the authorized reviewer
    pub original_text: PiiString,

    #[serde(default)]
    pub reviewer_id: Option<String>,

    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub reviewer_notes: String,
}

impl ReviewItem {
    pub fn record_id(&self) -> &str {
        self.record.id().as_str()
    }

    pub fn status(&self) -> ReviewStatus {
        self.record.review_status()
    }

    pub fn review_reasons(&self) -> &[String] {
        self.record.review_reasons()
    }

    pub fn grammar_issue_count(&self) -> usize {
        self.record.grammar_issues().len()
    }

    pub fn completeness_score(&self) -> Option<f64> {
        self.record
            .semantic()
            .and_then(|s| s.completeness.as_ref())
            .map(|c| c.score)
    }
}

/// Item counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatistics {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub modified: usize,
}

/// In-memory review queue
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: BTreeMap<String, ReviewItem>,
    deanonymizer: DeAnonymizer,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record belongs in the queue
    ///
    /// Routed records go in unless they were auto-accepted without any
    /// review reason.
    pub fn needs_review(record: &Record) -> bool {
        match record.route() {
            Some(RouteDecision::AutoAccepted) => !record.review_reasons().is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    /// Queue a record if it needs review
    ///
    /// Returns whether the record was queued.
    ///
    /// # Errors
    ///
    /// [`FerpaError::MappingIntegrity`] when the record's text cannot be
    /// restored.
    pub fn add(&mut self, record: Record) -> Result<bool> {
        if !Self::needs_review(&record) {
            return Ok(false);
        }

        let original = self.deanonymizer.restore(&record)?;
        let id = record.id().to_string();
        tracing::debug!(
            record_id = %id,
            status = record.review_status().label(),
            reasons = record.review_reasons().len(),
            "Record queued for review"
        );
        self.items.insert(
            id,
            ReviewItem {
                record,
                original_text: pii_string(original),
                reviewer_id: None,
                reviewed_at: None,
                reviewer_notes: String::new(),
            },
        );
        Ok(true)
    }

    /// Queue every record that needs review
    ///
    /// A record whose text cannot be restored is skipped with a warning.
    pub fn add_all(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut added = 0;
        for record in records {
            let id = record.id().clone();
            match self.add(record) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(record_id = %id, error = %e, "Record could not be queued")
                }
            }
        }
        tracing::info!(added, total = self.items.len(), "Review queue updated");
        added
    }

    /// Up to `limit` pending items, ordered by record id
    pub fn pending(&self, limit: usize) -> Vec<&ReviewItem> {
        self.items
            .values()
            .filter(|item| item.status() == ReviewStatus::Pending)
            .take(limit)
            .collect()
    }

    pub fn get(&self, record_id: &str) -> Option<&ReviewItem> {
        self.items.get(record_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Record a reviewer's decision
    ///
    /// # Errors
    ///
    /// [`FerpaError::Validation`] for an unknown record id or a `pending`
    /// status.
    pub fn update_status(
        &mut self,
        record_id: &str,
        status: ReviewStatus,
        reviewer_id: &str,
        notes: &str,
    ) -> Result<()> {
        if !status.is_final() {
            return Err(FerpaError::Validation(
                "review decisions must be approved, rejected or modified".to_string(),
            ));
        }
        let item = self.items.remove(record_id).ok_or_else(|| {
            FerpaError::Validation(format!("record {record_id} is not in the review queue"))
        })?;

        let old_status = item.status();
        let updated = ReviewItem {
            record: item.record.with_review_status(status),
            original_text: item.original_text,
            reviewer_id: Some(reviewer_id.to_string()),
            reviewed_at: Some(Utc::now()),
            reviewer_notes: notes.to_string(),
        };
        self.items.insert(record_id.to_string(), updated);

        tracing::info!(
            record_id,
            old_status = old_status.label(),
            new_status = status.label(),
            reviewer_id,
            "Review status updated"
        );
        Ok(())
    }

    pub fn statistics(&self) -> ReviewStatistics {
        let mut stats = ReviewStatistics {
            total: self.items.len(),
            ..Default::default()
        };
        for item in self.items.values() {
            match item.status() {
                ReviewStatus::Pending => stats.pending += 1,
                ReviewStatus::Approved => stats.approved += 1,
                ReviewStatus::Rejected => stats.rejected += 1,
                ReviewStatus::Modified => stats.modified += 1,
            }
        }
        stats
    }

    /// Approved items as pretty JSON
    pub fn export_approved_json(&self) -> Result<String> {
        let approved: Vec<&ReviewItem> = self
            .items
            .values()
            .filter(|item| item.status() == ReviewStatus::Approved)
            .collect();
        Ok(serde_json::to_string_pretty(&approved)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use secrecy::ExposeSecret;

    fn routed(id: &str, decision: RouteDecision, reasons: &[&str]) -> Record {
        Record::builder()
            .id(RecordId::new(id).unwrap())
            .expected_name("Ana Lopez")
            .text("Ana did well.")
            .build()
            .unwrap()
            .routed(decision, reasons.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_only_review_worthy_records_are_queued() {
        let mut queue = ReviewQueue::new();
        let added = queue.add_all(vec![
            routed("r1", RouteDecision::AutoAccepted, &[]),
            routed("r2", RouteDecision::NeedsReview, &["no student name found in comment"]),
            routed("r3", RouteDecision::AutoRejected, &[]),
            routed("r4", RouteDecision::AutoAccepted, &["grade/comment inconsistency"]),
        ]);

        assert_eq!(added, 3);
        assert!(queue.get("r1").is_none());
        let pending: Vec<&str> = queue.pending(10).iter().map(|i| i.record_id()).collect();
        assert_eq!(pending, vec!["r2"]);
    }

    #[test]
    fn test_update_status_and_statistics() {
        let mut queue = ReviewQueue::new();
        queue.add(routed("r1", RouteDecision::NeedsReview, &[])).unwrap();
        queue.add(routed("r2", RouteDecision::NeedsReview, &[])).unwrap();

        queue
            .update_status("r1", ReviewStatus::Approved, "teacher-7", "fine as is")
            .unwrap();

        let item = queue.get("r1").unwrap();
        assert_eq!(item.status(), ReviewStatus::Approved);
        assert_eq!(item.reviewer_id.as_deref(), Some("teacher-7"));
        assert!(item.reviewed_at.is_some());
        assert_eq!(item.original_text.expose_secret().as_str(), "Ana did well.");

        let stats = queue.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
    }

    #[test]
    fn test_update_unknown_or_pending_is_rejected() {
        let mut queue = ReviewQueue::new();
        queue.add(routed("r1", RouteDecision::NeedsReview, &[])).unwrap();
        assert!(queue
            .update_status("nope", ReviewStatus::Approved, "t", "")
            .is_err());
        assert!(queue
            .update_status("r1", ReviewStatus::Pending, "t", "")
            .is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pending_limit() {
        let mut queue = ReviewQueue::new();
        for i in 0..5 {
            queue
                .add(routed(&format!("r{i}"), RouteDecision::NeedsReview, &[]))
                .unwrap();
        }
        assert_eq!(queue.pending(2).len(), 2);
    }

    #[test]
    fn test_export_approved_json() {
        let mut queue = ReviewQueue::new();
        queue.add(routed("r1", RouteDecision::NeedsReview, &[])).unwrap();
        queue.add(routed("r2", RouteDecision::NeedsReview, &[])).unwrap();
        queue
            .update_status("r2", ReviewStatus::Approved, "t", "")
            .unwrap();

        let json = queue.export_approved_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert!(json.contains("\"r2\""));
    }
}
