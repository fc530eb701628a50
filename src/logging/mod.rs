//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - A human-readable console layer
//! - Configurable log levels (`RUST_LOG` overrides)
//! - Local JSON file logging with rotation
//!
//! Log events carry record ids, stage names, counts, entity type labels and
//! hashes. Comment text and student names are never logged.
//!
//! # Example
//!
//! ```no_run
//! use ferpa_feedback::logging::init_logging;
//! use ferpa_feedback::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(records = 12, "Batch loaded");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline stage for a record
///
/// # Example
///
/// ```no_run
/// use ferpa_feedback::log_stage_start;
/// use ferpa_feedback::domain::RecordId;
///
/// let id = RecordId::new("doc-1:3").unwrap();
/// log_stage_start!(&id, "anonymize");
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($record_id:expr, $stage:expr) => {
        tracing::debug!(
            record_id = %$record_id,
            stage = $stage,
            "Stage started"
        );
    };
}

/// Log the completion of a pipeline stage for a record
///
/// # Example
///
/// ```no_run
/// use ferpa_feedback::log_stage_complete;
/// use ferpa_feedback::domain::RecordId;
/// use std::time::Duration;
///
/// let id = RecordId::new("doc-1:3").unwrap();
/// log_stage_complete!(&id, "anonymize", Duration::from_millis(4));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($record_id:expr, $stage:expr, $duration:expr) => {
        tracing::debug!(
            record_id = %$record_id,
            stage = $stage,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log a gate refusal
///
/// # Example
///
/// ```no_run
/// use ferpa_feedback::log_gate_blocked;
///
/// log_gate_blocked!("doc-1:3", 2);
/// ```
#[macro_export]
macro_rules! log_gate_blocked {
    ($record_id:expr, $residual_count:expr) => {
        tracing::warn!(
            record_id = %$record_id,
            residual_count = $residual_count,
            "Anonymization gate blocked external analysis"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use ferpa_feedback::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "rate limited");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::RecordId;
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let id = RecordId::new("rec-1").unwrap();
        log_stage_start!(&id, "grammar");
        log_stage_complete!(&id, "grammar", Duration::from_millis(3));
        log_gate_blocked!(&id, 1usize);
        log_retry_attempt!(1u32, 3u32, 1000u64, "timeout");
    }
}
