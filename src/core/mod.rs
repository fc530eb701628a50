//! Core pipeline logic
//!
//! # Modules
//!
//! - [`pipeline`] - Stage orchestration, routing and batch outcomes
//! - [`retry`] - Bounded retry with exponential backoff for external calls
//! - [`shared`] - Lazily built backends shared across worker tasks
//!
//! # Example
//!
//! ```rust,no_run
//! use ferpa_feedback::config::load_config;
//! use ferpa_feedback::core::pipeline::Orchestrator;
//! use ferpa_feedback::domain::Record;
//!
//! # async fn example(records: Vec<Record>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferpa-feedback.toml")?;
//! let orchestrator = Orchestrator::from_config(&config, None)?;
//!
//! let run = orchestrator.run_batch(records).await;
//! println!("Routed: {}", run.outcome.succeeded);
//! println!("Needs review: {}", run.outcome.needs_review);
//! println!("Failed: {}", run.outcome.failed);
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod retry;
pub mod shared;
