//! Review command implementation
//!
//! Reads a local results file and restores original text for an authorized
//! reviewer. Runs entirely offline.

use crate::adapters::ingestion::ResultsFile;
use crate::cli::{EXIT_FATAL, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::review::{DeAnonymizer, ReviewQueue};
use clap::Args;
use secrecy::ExposeSecret;
use std::path::PathBuf;

/// Arguments for the review command
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Results file written by `process`
    #[arg(long, default_value = "results.json")]
    pub results: PathBuf,

    /// Restore a single record
    #[arg(long)]
    pub record: Option<String>,

    /// Maximum pending items to show
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

impl ReviewArgs {
    /// Execute the review command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let results = match ResultsFile::read(&self.results) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Failed to read results: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if let Some(ref id) = self.record {
            return Ok(Self::show_record(&results, id));
        }

        let total = results.records.len();
        let expected = results
            .records
            .iter()
            .filter(|r| ReviewQueue::needs_review(r))
            .count();
        let mut queue = ReviewQueue::new();
        let queued = queue.add_all(results.records);
        let stats = queue.statistics();

        println!("📋 Review Queue ({queued} of {total} records):");
        println!(
            "  Pending: {}  Approved: {}  Rejected: {}  Modified: {}",
            stats.pending, stats.approved, stats.rejected, stats.modified
        );
        println!();

        for item in queue.pending(self.limit) {
            println!("── {} (grade {})", item.record_id(), item.record.grade());
            for reason in item.review_reasons() {
                println!("   • {reason}");
            }
            println!("   {}", item.original_text.expose_secret().as_str());
            println!();
        }

        if queued < expected {
            println!("⚠️  Some records could not be restored; see the log for details");
            return Ok(EXIT_PARTIAL);
        }
        Ok(EXIT_SUCCESS)
    }

    fn show_record(results: &ResultsFile, id: &str) -> i32 {
        let Some(record) = results.records.iter().find(|r| r.id().as_str() == id) else {
            eprintln!("Record {id} not found in results");
            return EXIT_PARTIAL;
        };

        match DeAnonymizer::new().restore(record) {
            Ok(text) => {
                println!("── {} [{}]", record.id(), record.state());
                for reason in record.review_reasons() {
                    println!("   • {reason}");
                }
                println!("{text}");
                EXIT_SUCCESS
            }
            Err(e) => {
                tracing::warn!(record_id = %record.id(), error = %e, "Record could not be restored");
                eprintln!("Record {id} could not be restored: {e}");
                EXIT_PARTIAL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::BatchOutcome;
    use crate::domain::{Record, RecordId};

    fn results_file(dir: &tempfile::TempDir) -> PathBuf {
        let record = Record::builder()
            .id(RecordId::new("r1").unwrap())
            .expected_name("Ana Lopez")
            .text("Ana did well.")
            .build()
            .unwrap();
        let path = dir.path().join("results.json");
        ResultsFile::new(BatchOutcome::new(), vec![record])
            .write(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_show_record() {
        let dir = tempfile::tempdir().unwrap();
        let args = ReviewArgs {
            results: results_file(&dir),
            record: Some("r1".to_string()),
            limit: 10,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let dir = tempfile::tempdir().unwrap();
        let args = ReviewArgs {
            results: results_file(&dir),
            record: Some("missing".to_string()),
            limit: 10,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_PARTIAL);
    }

    #[tokio::test]
    async fn test_missing_results_file() {
        let args = ReviewArgs {
            results: PathBuf::from("/nonexistent/results.json"),
            record: None,
            limit: 10,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_FATAL);
    }
}
