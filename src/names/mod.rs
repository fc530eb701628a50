//! Student-name verification
//!
//! Confirms that a comment is about the student it is filed under:
//!
//! - [`extractor`]: pluggable backends that find candidate names in text
//! - [`normalize`]: suffix, punctuation and ordering normalization
//! - [`nicknames`]: configurable alias/canonical table
//! - [`matcher`]: token-order-insensitive fuzzy matching and tiering
//!
//! # Example
//!
//! ```
//! use ferpa_feedback::names::{NameMatcher, NicknameTable};
//! use ferpa_feedback::domain::ConfidenceTier;
//! use std::sync::Arc;
//!
//! let matcher = NameMatcher::new(Arc::new(NicknameTable::empty()));
//! let result = matcher.match_name(Some("Obrien"), "Mary O'Brien", &[], "capitalized");
//! assert!(result.tier >= ConfidenceTier::Medium);
//! ```

pub mod config;
pub mod extractor;
pub mod matcher;
pub mod nicknames;
pub mod normalize;

pub use config::NamesConfig;
pub use extractor::{
    CapitalizedNameExtractor, ExtractorKind, FallbackExtractor, LazyExtractor, NameExtractor,
    RosterExtractor,
};
pub use matcher::{ExtractedName, NameMatcher, DEFAULT_SIMILARITY_THRESHOLD};
pub use nicknames::NicknameTable;
pub use normalize::normalize_name;
