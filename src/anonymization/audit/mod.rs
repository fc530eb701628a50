//! Audit logging module
//!
//! Every gate authorization attempt, successful or not, produces one
//! [`AuditEntry`]. Entries carry the record id, outcome, timestamp and a
//! SHA-256 hash of the candidate payload; raw text never reaches a sink.
//! Sinks are append-only and safe for concurrent appends.

pub mod logger;

pub use logger::AuditLogger;

use crate::anonymization::models::EntityType;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Mutex;

/// Outcome of a gate authorization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Payload verified clean and released for the external call
    Authorized,
    /// Residual entities found; payload withheld
    Blocked,
    /// Verification could not complete; payload withheld
    VerificationFailed,
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub record_id: String,
    pub outcome: AuditOutcome,
    /// SHA-256 of the candidate payload, lowercase hex
    pub payload_hash: String,
    /// Placeholders present in the payload
    pub placeholder_count: usize,
    /// Entity types found by the verification re-scan
    #[serde(default)]
    pub residual_types: Vec<EntityType>,
}

impl AuditEntry {
    pub fn new(record_id: impl Into<String>, outcome: AuditOutcome, payload: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            record_id: record_id.into(),
            outcome,
            payload_hash: sha256_hex(payload),
            placeholder_count: 0,
            residual_types: Vec::new(),
        }
    }

    pub fn with_placeholder_count(mut self, count: usize) -> Self {
        self.placeholder_count = count;
        self
    }

    pub fn with_residual_types(mut self, types: Vec<EntityType>) -> Self {
        self.residual_types = types;
        self
    }
}

/// Append-only audit destination
pub trait AuditSink: Send + Sync {
    /// Append one entry; each call is written atomically with respect to other calls
    fn record(&self, entry: &AuditEntry) -> Result<()>;
}

/// In-memory sink for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded entries
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("audit sink lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}

/// Sink that discards entries (development only; rejected in production)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: &AuditEntry) -> Result<()> {
        Ok(())
    }
}

/// SHA-256 of a string, lowercase hex
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
