//! Nickname table
//!
//! Configurable alias -> canonical given-name data. Lookups are
//! case-insensitive and work in both directions.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct NicknameFile {
    nicknames: BTreeMap<String, Vec<String>>,
}

/// Bidirectional nickname lookup
#[derive(Debug, Clone, Default)]
pub struct NicknameTable {
    to_canonical: HashMap<String, Vec<String>>,
    to_aliases: HashMap<String, Vec<String>>,
}

impl NicknameTable {
    /// Empty table (no expansion)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a table from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read nickname table: {}", path.as_ref().display())
        })?;
        Self::from_toml(&content)
    }

    /// Parse a table from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: NicknameFile =
            toml::from_str(content).context("Failed to parse nickname table TOML")?;
        Ok(Self::from_pairs(file.nicknames))
    }

    /// The embedded default table
    pub fn default_table() -> Result<Self> {
        Self::from_toml(include_str!("../../patterns/nicknames.toml"))
    }

    /// Build from alias -> canonical names pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut to_canonical: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut to_aliases: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (alias, canonicals) in pairs {
            let alias = alias.as_ref().trim().to_lowercase();
            if alias.is_empty() {
                continue;
            }
            for canonical in canonicals {
                let canonical = canonical.as_ref().trim().to_lowercase();
                if canonical.is_empty() || canonical == alias {
                    continue;
                }
                to_canonical
                    .entry(alias.clone())
                    .or_default()
                    .insert(canonical.clone());
                to_aliases
                    .entry(canonical)
                    .or_default()
                    .insert(alias.clone());
            }
        }

        let flatten = |map: BTreeMap<String, BTreeSet<String>>| -> HashMap<String, Vec<String>> {
            map.into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect()
        };

        Self {
            to_canonical: flatten(to_canonical),
            to_aliases: flatten(to_aliases),
        }
    }

    /// Canonical names an alias abbreviates ("bill" -> ["william"])
    pub fn canonical_forms(&self, name: &str) -> &[String] {
        self.to_canonical
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Aliases of a canonical name ("william" -> ["bill", "billy", ...])
    pub fn aliases_of(&self, name: &str) -> &[String] {
        self.to_aliases
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of aliases in the table
    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }
}
