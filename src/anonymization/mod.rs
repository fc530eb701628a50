//! Anonymization engine and FERPA compliance gate
//!
//! Student comments cross a trust boundary when they are sent for semantic
//! analysis. This module guarantees nothing identifying crosses it.
//!
//! # Architecture
//!
//! - **Detection**: pattern library and roster-name backends combined behind
//!   one score threshold ([`detector`])
//! - **Anonymization**: typed, numbered placeholders plus a per-record
//!   mapping ([`anonymizer`])
//! - **Gate**: re-scans anonymized text and issues [`SafeText`] ([`gate`])
//! - **Audit**: hash-only, append-only record of every gate decision ([`audit`])
//! - **Compliance**: the always-on anonymization invariant ([`compliance`])
//!
//! # Usage
//!
//! ```rust,no_run
//! use ferpa_feedback::anonymization::{
//!     audit::MemoryAuditSink, config::DetectionConfig, AnonymizationGate, Anonymizer,
//! };
//! use ferpa_feedback::domain::Record;
//! use ferpa_feedback::names::NicknameTable;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let detector = DetectionConfig::default().build_detector(None, &NicknameTable::empty())?;
//! let anonymizer = Arc::new(Anonymizer::new(Arc::new(detector)));
//! let gate = AnonymizationGate::new(anonymizer, Arc::new(MemoryAuditSink::new()));
//!
//! let record = Record::builder()
//!     .expected_name("Ana Lopez")
//!     .text("Email ana@example.com for the rubric.")
//!     .build()?;
//! let safe = gate.authorize_for_external_call(&record)?;
//! assert_eq!(safe.as_str(), "Email [EMAIL_1] for the rubric.");
//! # Ok(())
//! # }
//! ```

pub mod anonymizer;
pub mod audit;
pub mod compliance;
pub mod config;
pub mod detector;
pub mod gate;
pub mod models;

// Re-export main types
pub use anonymizer::{Anonymized, Anonymizer, PlaceholderMapping};
pub use config::{DetectionConfig, FerpaConfig};
pub use detector::{CompositeDetector, EntityDetector};
pub use gate::{AnonymizationGate, SafeText};
pub use models::{DetectionMethod, EntitySpan, EntityType};
