//! Configuration management
//!
//! TOML configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FERPA_*` environment overrides
//! - Default values for every setting
//! - Validation before any record is processed
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ferpa_feedback::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferpa-feedback.toml")?;
//! println!("Concurrency: {}", config.pipeline.concurrency);
//! println!("Auto-accept at: {}", config.thresholds.auto_accept);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! environment = "production"
//!
//! [detection]
//! score_threshold = 0.3
//!
//! [names]
//! similarity_threshold = 85
//! extractor = "roster"
//! fallback = "capitalized"
//!
//! [thresholds]
//! auto_accept = 95
//! human_review = 80
//! auto_reject = 50
//!
//! [ferpa]
//! audit_log_path = "${FERPA_AUDIT_DIR}/gate.jsonl"
//! ```
//!
//! `anonymize_before_api` may be omitted or set to `true`; `false` is a
//! configuration error.

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, FerpaFeedbackConfig, LoggingConfig, PipelineConfig,
    RetryConfig,
};
