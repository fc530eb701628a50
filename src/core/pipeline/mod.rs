//! Record pipeline
//!
//! - [`orchestrator`]: stage ordering, bounded concurrency, cancellation
//! - [`routing`]: confidence thresholds and the worst-signal routing rule
//! - [`outcome`]: batch counts and redacted error descriptors

pub mod orchestrator;
pub mod outcome;
pub mod routing;

pub use orchestrator::{BatchRun, Orchestrator, OrchestratorBuilder};
pub use outcome::BatchOutcome;
pub use routing::{
    route, ConfidenceThresholds, Routing, REASON_GATE_BLOCKED, REASON_INCOMPLETE,
    REASON_INCONSISTENT, REASON_NAME_LOW, REASON_NAME_MEDIUM, REASON_NO_NAME, REASON_NO_SIGNALS,
};
