//! Process command implementation
//!
//! Loads records (and optionally a roster), runs the batch and writes the
//! processed records with their mappings to a local results file.

use crate::adapters::ingestion::{load_records, load_roster, ResultsFile};
use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::pipeline::{BatchOutcome, OrchestratorBuilder};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// JSON array of records to process
    #[arg(short, long)]
    pub input: PathBuf,

    /// Class roster (JSON)
    #[arg(short, long)]
    pub roster: Option<PathBuf>,

    /// Where to write processed records
    #[arg(short, long, default_value = "results.json")]
    pub output: PathBuf,

    /// Override the audit log path
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Override the worker pool size
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl ProcessArgs {
    /// Execute the process command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting process command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(ref path) = self.audit_log {
            tracing::info!(path = %path.display(), "Overriding audit log path from CLI");
            config.ferpa.audit_log_path = path.clone();
        }
        if let Some(concurrency) = self.concurrency {
            tracing::info!(concurrency, "Overriding concurrency from CLI");
            config.pipeline.concurrency = concurrency;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let roster = match self.roster.as_ref().map(load_roster).transpose() {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load roster");
                eprintln!("Failed to load roster: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let records = match load_records(&self.input, roster.as_ref()) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load records");
                eprintln!("Failed to load records: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let orchestrator = match OrchestratorBuilder::from_config(&config, roster.as_ref())
            .and_then(|b| b.cancellation(shutdown_signal).build())
        {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pipeline");
                eprintln!("Failed to initialize pipeline: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("🚀 Processing {} records...", records.len());
        println!();

        let run = orchestrator.run_batch(records).await;
        Self::print_summary(&run.outcome);

        let results = ResultsFile::new(run.outcome, run.records);
        if let Err(e) = results.write(&self.output) {
            tracing::error!(error = %e, "Failed to write results");
            eprintln!("Failed to write results: {e}");
            return Ok(EXIT_FATAL);
        }
        println!("💾 Results written to {}", self.output.display());
        println!();

        Ok(Self::exit_code(&results.outcome))
    }

    fn print_summary(outcome: &BatchOutcome) {
        println!("📊 Batch Summary:");
        println!("  Processed: {}", outcome.processed);
        println!("  Routed: {}", outcome.succeeded);
        println!("    Auto-accepted: {}", outcome.auto_accepted);
        println!("    Needs review: {}", outcome.needs_review);
        println!("    Auto-rejected: {}", outcome.auto_rejected);
        println!("  Blocked by gate: {}", outcome.blocked_by_gate);
        println!("  Failed: {}", outcome.failed);
        if outcome.cancelled > 0 {
            println!("  Not started: {}", outcome.cancelled);
        }
        println!("  Duration: {:.2}s", outcome.duration().as_secs_f64());
        println!("  Success Rate: {:.2}%", outcome.success_rate());
        println!();

        let failures: Vec<_> = outcome
            .errors
            .iter()
            .filter(|e| e.kind != "cancelled")
            .collect();
        if !failures.is_empty() {
            println!("⚠️  Errors encountered:");
            for (i, error) in failures.iter().enumerate() {
                if i < 10 {
                    println!("  - {} [{}]: {}", error.record_id, error.kind, error.message);
                }
            }
            if failures.len() > 10 {
                println!("  ... and {} more errors", failures.len() - 10);
            }
            println!();
        }
    }

    fn exit_code(outcome: &BatchOutcome) -> i32 {
        if outcome.was_cancelled() {
            println!("⚠️  Processing interrupted. Unstarted records were left unprocessed.");
            tracing::info!("Processing interrupted by user signal");
            EXIT_INTERRUPTED
        } else if outcome.is_successful() {
            println!("✅ Processing completed successfully!");
            EXIT_SUCCESS
        } else {
            println!("⚠️  Processing completed with failures or gate blocks");
            EXIT_PARTIAL
        }
    }
}
