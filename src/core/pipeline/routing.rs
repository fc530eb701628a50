//! Confidence thresholds and routing
//!
//! A record's route is decided by its *worst* confidence signal. Signals are
//! never averaged: one low signal is enough to send a record to review.

use crate::domain::{ConfidenceTier, Record, RouteDecision};
use serde::{Deserialize, Serialize};

/// Review reason: weak name match
pub const REASON_NAME_LOW: &str = "name match confidence LOW";
/// Review reason: medium name match
pub const REASON_NAME_MEDIUM: &str = "name match confidence MEDIUM";
/// Review reason: no name found
pub const REASON_NO_NAME: &str = "no student name found in comment";
/// Review reason: gate refusal
pub const REASON_GATE_BLOCKED: &str = "external analysis skipped: blocked by anonymization gate";
/// Review reason: incomplete comment
pub const REASON_INCOMPLETE: &str = "completeness below threshold";
/// Review reason: grade/comment mismatch
pub const REASON_INCONSISTENT: &str = "grade/comment inconsistency";
/// Review reason: nothing to decide on
pub const REASON_NO_SIGNALS: &str = "no confidence signals available";

/// Score bands on the 0-100 scale
///
/// Bands are inclusive at their lower bound:
///
/// | score                          | tier   | band          |
/// |--------------------------------|--------|---------------|
/// | `>= auto_accept`               | HIGH   | AUTO_ACCEPTED |
/// | `>= human_review`              | MEDIUM | NEEDS_REVIEW  |
/// | `>= auto_reject`               | LOW    | NEEDS_REVIEW  |
/// | `< auto_reject`                | LOW    | AUTO_REJECTED |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    #[serde(default = "default_auto_accept")]
    pub auto_accept: f64,

    #[serde(default = "default_human_review")]
    pub human_review: f64,

    #[serde(default = "default_auto_reject")]
    pub auto_reject: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            auto_accept: default_auto_accept(),
            human_review: default_human_review(),
            auto_reject: default_auto_reject(),
        }
    }
}

impl ConfidenceThresholds {
    /// Create validated thresholds
    pub fn new(auto_accept: f64, human_review: f64, auto_reject: f64) -> Result<Self, String> {
        let thresholds = Self {
            auto_accept,
            human_review,
            auto_reject,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check `0 <= auto_reject < human_review <= auto_accept <= 100`
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("auto_accept", self.auto_accept),
            ("human_review", self.human_review),
            ("auto_reject", self.auto_reject),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!(
                    "thresholds.{} must be between 0 and 100, got {}",
                    name, value
                ));
            }
        }
        if self.auto_reject >= self.human_review {
            return Err(format!(
                "thresholds.auto_reject ({}) must be below thresholds.human_review ({})",
                self.auto_reject, self.human_review
            ));
        }
        if self.human_review > self.auto_accept {
            return Err(format!(
                "thresholds.human_review ({}) must not exceed thresholds.auto_accept ({})",
                self.human_review, self.auto_accept
            ));
        }
        Ok(())
    }

    /// Confidence tier for a score; exactly one tier for every input
    pub fn tier(&self, score: f64) -> ConfidenceTier {
        if score >= self.auto_accept {
            ConfidenceTier::High
        } else if score >= self.human_review {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Routing band for a score
    ///
    /// A score that is not a number lands in review.
    pub fn band(&self, score: f64) -> RouteDecision {
        if score >= self.auto_accept {
            RouteDecision::AutoAccepted
        } else if score < self.auto_reject {
            RouteDecision::AutoRejected
        } else {
            RouteDecision::NeedsReview
        }
    }
}

/// Where a routing signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    NameMatch,
    Completeness,
    Consistency,
}

/// One confidence signal on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub source: SignalSource,
    pub score: f64,
}

/// Routing result for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    pub decision: RouteDecision,
    pub reasons: Vec<String>,
    /// Lowest signal score, if any signal was available
    pub min_score: Option<f64>,
}

/// Confidence signals available on a record
pub fn signals(record: &Record) -> Vec<Signal> {
    let mut signals = Vec::new();
    if let Some(name) = record.name_match() {
        signals.push(Signal {
            source: SignalSource::NameMatch,
            score: name.score,
        });
    }
    if let Some(semantic) = record.semantic() {
        if let Some(ref completeness) = semantic.completeness {
            signals.push(Signal {
                source: SignalSource::Completeness,
                score: completeness.confidence_signal(),
            });
        }
        if let Some(ref consistency) = semantic.consistency {
            signals.push(Signal {
                source: SignalSource::Consistency,
                score: consistency.confidence_signal(),
            });
        }
    }
    signals
}

/// Decide the route for a record
///
/// Each signal is banded on its own and the most severe band wins. A name
/// signal can send a record to review but never rejects it: an unconfirmed
/// name is ambiguity, not evidence of a bad comment. A record the gate
/// blocked, or one with no signals at all, is reviewed at minimum.
pub fn route(record: &Record, thresholds: &ConfidenceThresholds) -> Routing {
    let signals = signals(record);
    let mut reasons = Vec::new();
    let mut decision = if signals.is_empty() {
        reasons.push(REASON_NO_SIGNALS.to_string());
        RouteDecision::NeedsReview
    } else {
        RouteDecision::AutoAccepted
    };

    for signal in &signals {
        let band = match signal.source {
            SignalSource::NameMatch => cap_at_review(thresholds.band(signal.score)),
            _ => thresholds.band(signal.score),
        };
        decision = worst(decision, band);
    }

    if let Some(name) = record.name_match() {
        if !name.has_extracted_name() {
            reasons.push(REASON_NO_NAME.to_string());
            decision = worst(decision, RouteDecision::NeedsReview);
        } else {
            match name.tier {
                ConfidenceTier::Low => reasons.push(REASON_NAME_LOW.to_string()),
                ConfidenceTier::Medium => reasons.push(REASON_NAME_MEDIUM.to_string()),
                ConfidenceTier::High => {}
            }
        }
    }

    if record.external_analysis_skipped() {
        reasons.push(REASON_GATE_BLOCKED.to_string());
        decision = worst(decision, RouteDecision::NeedsReview);
    }

    if let Some(semantic) = record.semantic() {
        if matches!(semantic.completeness, Some(ref c) if !c.is_complete) {
            reasons.push(REASON_INCOMPLETE.to_string());
        }
        if matches!(semantic.consistency, Some(ref c) if !c.is_consistent) {
            reasons.push(REASON_INCONSISTENT.to_string());
        }
    }

    let min_score = signals
        .iter()
        .map(|s| s.score)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))));

    Routing {
        decision,
        reasons,
        min_score,
    }
}

fn worst(a: RouteDecision, b: RouteDecision) -> RouteDecision {
    if b.severity() > a.severity() {
        b
    } else {
        a
    }
}

fn cap_at_review(decision: RouteDecision) -> RouteDecision {
    match decision {
        RouteDecision::AutoRejected => RouteDecision::NeedsReview,
        other => other,
    }
}

fn default_auto_accept() -> f64 {
    95.0
}

fn default_human_review() -> f64 {
    80.0
}

fn default_auto_reject() -> f64 {
    50.0
}
