//! FERPA compliance invariant

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The `anonymize_before_api` setting
///
/// A unit type: the only representable value is "on". Deserializing `false`
/// fails, so a configuration that tries to disable anonymization is rejected
/// at parse time and no code path can observe it as off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymizeBeforeApi;

impl AnonymizeBeforeApi {
    pub const fn is_enabled(&self) -> bool {
        true
    }
}

impl Serialize for AnonymizeBeforeApi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

struct AnonymizeVisitor;

impl Visitor<'_> for AnonymizeVisitor {
    type Value = AnonymizeBeforeApi;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the boolean `true`")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        if value {
            Ok(AnonymizeBeforeApi)
        } else {
            Err(E::custom(
                "anonymize_before_api cannot be disabled: student text must be anonymized before any external call",
            ))
        }
    }
}

impl<'de> Deserialize<'de> for AnonymizeBeforeApi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bool(AnonymizeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Section {
        #[serde(default)]
        anonymize_before_api: AnonymizeBeforeApi,
    }

    #[test]
    fn test_true_accepted() {
        let section: Section = toml::from_str("anonymize_before_api = true").unwrap();
        assert!(section.anonymize_before_api.is_enabled());
    }

    #[test]
    fn test_false_rejected() {
        let err = toml::from_str::<Section>("anonymize_before_api = false").unwrap_err();
        assert!(err.to_string().contains("cannot be disabled"));
    }

    #[test]
    fn test_missing_defaults_on() {
        let section: Section = toml::from_str("").unwrap();
        assert!(section.anonymize_before_api.is_enabled());
    }

    #[test]
    fn test_non_bool_rejected() {
        assert!(toml::from_str::<Section>("anonymize_before_api = \"no\"").is_err());
    }

    #[test]
    fn test_serializes_as_true() {
        let out = toml::to_string(&Section {
            anonymize_before_api: AnonymizeBeforeApi,
        })
        .unwrap();
        assert!(out.contains("anonymize_before_api = true"));
    }
}
