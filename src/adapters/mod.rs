//! Collaborator interfaces and local implementations
//!
//! - [`ingestion`] - JSON record and roster loading, local results files
//! - [`grammar`] - Grammar checker capability and a small rule-based checker
//! - [`semantic`] - Semantic analyzer capability; the only consumer of
//!   [`SafeText`](crate::anonymization::SafeText)
//!
//! Adapters isolate external systems behind traits so the pipeline can be
//! tested with in-process implementations.

pub mod grammar;
pub mod ingestion;
pub mod semantic;

pub use grammar::{GrammarChecker, NoopGrammarChecker, RuleGrammarChecker};
pub use ingestion::{load_records, load_roster, RecordInput, ResultsFile};
pub use semantic::{DisabledAnalyzer, HeuristicAnalyzer, SemanticAnalyzer};
