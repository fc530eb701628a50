//! Compliance module
//!
//! FERPA rules for the external-analysis boundary.
//!
//! # Protected information
//!
//! Every [`EntityType`](crate::anonymization::models::EntityType) the
//! detectors produce is treated as education-record PII and must be replaced
//! before text leaves the process. There is no mode that relaxes this.
//!
//! # Examples
//!
//! ```
//! use ferpa_feedback::anonymization::compliance::AnonymizeBeforeApi;
//!
//! #[derive(serde::Deserialize)]
//! struct Ferpa {
//!     anonymize_before_api: AnonymizeBeforeApi,
//! }
//!
//! let ok: Ferpa = toml::from_str("anonymize_before_api = true").unwrap();
//! assert!(ok.anonymize_before_api.is_enabled());
//! assert!(toml::from_str::<Ferpa>("anonymize_before_api = false").is_err());
//! ```

pub mod ferpa;

pub use ferpa::AnonymizeBeforeApi;
