//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`StudentId`])
//! - **Domain models** ([`Record`], [`ClassRoster`], analysis results)
//! - **Protected PII storage** ([`pii::PiiString`])
//! - **Error types** ([`FerpaError`], [`MappingIntegrityError`], [`RecordError`])
//! - **Result type alias** ([`Result`])
//!
//! # Builder Pattern
//!
//! ```rust
//! use ferpa_feedback::domain::{Record, RecordId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let record = Record::builder()
//!     .id(RecordId::new("doc-1:3")?)
//!     .expected_name("Jonathan Smith")
//!     .known_variants(["John Smith"])
//!     .text("John Smith did well this term")
//!     .grade("A")
//!     .build()?;
//! assert_eq!(record.expected_name(), "Jonathan Smith");
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod errors;
pub mod ids;
pub mod pii;
pub mod record;
pub mod result;
pub mod roster;

pub use analysis::{
    CompletenessResult, ConfidenceTier, ConsistencyResult, GrammarIssue, NameMatchResult,
    SemanticAnalysis, Sentiment,
};
pub use errors::{FerpaError, MappingIntegrityError, RecordError};
pub use ids::{RecordId, StudentId};
pub use record::{Record, RecordBuilder, RecordState, ReviewStatus, RouteDecision, StageTransition};
pub use result::Result;
pub use roster::{ClassRoster, RosterEntry};
