//! Protected storage for original PII substrings
//!
//! Original values captured by the anonymizer are held in a `Secret` so that
//! they are zeroed on drop, redacted in `Debug` output and only reachable
//! through an explicit `expose_secret()` call.
//!
//! # Example
//!
//! ```rust
//! use ferpa_feedback::domain::pii::pii_string;
//! use secrecy::ExposeSecret;
//!
//! let original = pii_string("Mary O'Brien");
//! assert_eq!(original.expose_secret().as_str(), "Mary O'Brien");
//! assert!(!format!("{original:?}").contains("Mary"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype over `String` carrying the traits `Secret` requires
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct PiiValue(String);

impl CloneableSecret for PiiValue {}
impl DebugSecret for PiiValue {}
impl SerializableSecret for PiiValue {}

impl PiiValue {
    /// Borrow the protected value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PiiValue {
    fn from(s: String) -> Self {
        PiiValue(s)
    }
}

impl From<&str> for PiiValue {
    fn from(s: &str) -> Self {
        PiiValue(s.to_string())
    }
}

impl PartialEq<str> for PiiValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for PiiValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PiiValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PiiValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(PiiValue)
    }
}

/// Secret wrapper for an original PII substring
pub type PiiString = Secret<PiiValue>;

/// Wrap a value as protected PII
#[inline]
pub fn pii_string(value: impl Into<PiiValue>) -> PiiString {
    Secret::new(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_pii_string_creation() {
        let value = pii_string("Jonathan Smith");
        assert_eq!(value.expose_secret().as_str(), "Jonathan Smith");
        assert_eq!(value.expose_secret().len(), 14);
    }

    #[test]
    fn test_debug_redacted() {
        let value = pii_string("student-ssn-123-45-6789");
        let debug_output = format!("{value:?}");
        assert!(!debug_output.contains("123-45-6789"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_serde_for_local_persistence() {
        #[derive(Serialize, Deserialize)]
        struct Entry {
            original: PiiString,
        }

        let entry = Entry {
            original: pii_string("Mary"),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("Mary"));

        let restored: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.original.expose_secret().as_str(), "Mary");
    }
}
