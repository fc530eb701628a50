// FERPA Feedback - privacy gate for AI-assisted review of teacher comments
// Copyright (c) 2025 FERPA Feedback Contributors
// Licensed under the MIT License

//! # FERPA Feedback
//!
//! A privacy-preserving pipeline for teacher-written student comments.
//! Comments are checked for grammar and name accuracy locally, anonymized,
//! verified by a fail-closed gate, analyzed, and routed to auto-accept,
//! human review or auto-reject.
//!
//! ## Trust boundary
//!
//! Grammar checking and name verification see raw text on the local side.
//! The semantic analyzer accepts only [`anonymization::SafeText`], a type
//! that only [`anonymization::AnonymizationGate`] can construct. Restoring
//! original text is confined to [`review`].
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline orchestration, routing, retries
//! - [`anonymization`] - Detection, placeholders, gate, audit
//! - [`names`] - Name extraction, normalization and matching
//! - [`adapters`] - Ingestion, grammar and semantic collaborators
//! - [`review`] - De-anonymization and the review queue
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferpa_feedback::adapters::ingestion::{load_records, load_roster};
//! use ferpa_feedback::config::load_config;
//! use ferpa_feedback::core::pipeline::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ferpa-feedback.toml")?;
//!     let roster = load_roster("roster.json")?;
//!     let records = load_records("records.json", Some(&roster))?;
//!
//!     let orchestrator = Orchestrator::from_config(&config, Some(&roster))?;
//!     let run = orchestrator.run_batch(records).await;
//!
//!     println!("Needs review: {}", run.outcome.needs_review);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`]. Per-record failures never
//! abort a batch; they surface as [`domain::RecordError`] descriptors in the
//! batch outcome. Error messages carry ids and counts, never comment text.

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod names;
pub mod review;
