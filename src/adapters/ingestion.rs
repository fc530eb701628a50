//! Local ingestion and results files
//!
//! Input is a JSON array of records extracted upstream from source
//! documents. A roster file supplies expected identities. Processed
//! records, including their placeholder mappings, are written to a local
//! results file for the review step. Nothing here touches the network.

use crate::core::pipeline::BatchOutcome;
use crate::domain::{ClassRoster, FerpaError, Record, RecordId, Result, StudentId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One record as supplied by the ingestion collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordInput {
    /// Record id; generated when absent
    #[serde(default)]
    pub id: Option<String>,

    /// Roster student id
    #[serde(default)]
    pub student_id: Option<String>,

    /// Expected name; looked up from the roster by `student_id` when absent
    #[serde(default)]
    pub student_name: Option<String>,

    #[serde(default)]
    pub known_variants: Vec<String>,

    pub text: String,

    #[serde(default)]
    pub grade: String,
}

impl RecordInput {
    /// Build an `INGESTED` record, resolving identity through the roster
    pub fn into_record(self, roster: Option<&ClassRoster>) -> Result<Record> {
        let mut builder = Record::builder().text(self.text).grade(self.grade);
        if let Some(id) = self.id {
            builder = builder.id(RecordId::new(id).map_err(FerpaError::Validation)?);
        }

        let student_id = self
            .student_id
            .map(StudentId::new)
            .transpose()
            .map_err(FerpaError::Validation)?;
        let entry = match (&student_id, roster) {
            (Some(id), Some(roster)) => roster.find_by_id(id),
            _ => None,
        };

        builder = match (self.student_name, entry) {
            (Some(name), _) => {
                let mut variants = self.known_variants;
                if let Some(entry) = entry {
                    for variant in entry.known_variants() {
                        if !variants.contains(&variant) {
                            variants.push(variant);
                        }
                    }
                }
                builder.expected_name(name).known_variants(variants)
            }
            (None, Some(entry)) => builder.student(entry),
            (None, None) => {
                return Err(FerpaError::Validation(
                    "record has no student_name and no roster entry for its student_id"
                        .to_string(),
                ))
            }
        };
        if let Some(id) = student_id {
            builder = builder.student_id(id);
        }

        builder.build()
    }
}

/// Load a class roster from a JSON file
pub fn load_roster(path: impl AsRef<Path>) -> Result<ClassRoster> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        FerpaError::Io(format!("Failed to read roster {}: {}", path.display(), e))
    })?;
    let roster: ClassRoster = serde_json::from_str(&contents)?;
    tracing::info!(
        class_id = %roster.class_id,
        students = roster.len(),
        "Roster loaded"
    );
    Ok(roster)
}

/// Load records from a JSON array file
///
/// A malformed entry fails the load and names its position; entry content
/// is not echoed.
pub fn load_records(path: impl AsRef<Path>, roster: Option<&ClassRoster>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        FerpaError::Io(format!("Failed to read records {}: {}", path.display(), e))
    })?;
    let inputs: Vec<RecordInput> = serde_json::from_str(&contents)?;

    let records = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input.into_record(roster).map_err(|e| {
                FerpaError::Validation(format!("record at position {index}: {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(records = records.len(), "Records loaded");
    Ok(records)
}

/// Processed batch as persisted locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub outcome: BatchOutcome,
    pub records: Vec<Record>,
}

impl ResultsFile {
    pub fn new(outcome: BatchOutcome, records: Vec<Record>) -> Self {
        Self { outcome, records }
    }

    /// Write the results as pretty JSON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                FerpaError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            FerpaError::Io(format!("Failed to write results {}: {}", path.display(), e))
        })?;
        tracing::info!(records = self.records.len(), path = %path.display(), "Results written");
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FerpaError::Io(format!("Failed to read results {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
