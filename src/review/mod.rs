//! Review side of the trust boundary
//!
//! De-anonymization and the human review queue. Nothing in this module
//! depends on a network-capable adapter; restored text stays local.

pub mod deanonymize;
pub mod queue;

pub use deanonymize::{deanonymize, DeAnonymizer};
pub use queue::{ReviewItem, ReviewQueue, ReviewStatistics};
