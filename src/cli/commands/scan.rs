//! Scan command implementation
//!
//! Dry run of detection and anonymization on a single text. Prints entity
//! types, offsets and the anonymized text; never the detected originals.

use crate::adapters::ingestion::load_roster;
use crate::anonymization::Anonymizer;
use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::{load_config, FerpaFeedbackConfig};
use crate::domain::RecordId;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Text to scan
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// File whose contents to scan
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Class roster (JSON) for roster-name detection
    #[arg(short, long)]
    pub roster: Option<PathBuf>,
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = if Path::new(config_path).exists() {
            match load_config(config_path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        } else {
            tracing::info!(config_path, "No configuration file; scanning with defaults");
            FerpaFeedbackConfig::default()
        };

        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Failed to read {}: {e}", path.display());
                    return Ok(EXIT_FATAL);
                }
            },
            (None, None) => {
                eprintln!("Provide --text or --file");
                return Ok(EXIT_FATAL);
            }
        };

        let roster = match self.roster.as_ref().map(load_roster).transpose() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Failed to load roster: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let nicknames = match config.names.load_nicknames() {
            Ok(n) => n,
            Err(e) => {
                eprintln!("Configuration error: {e:#}");
                return Ok(EXIT_CONFIG);
            }
        };
        let detector = match config.detection.build_detector(roster.as_ref(), &nicknames) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Configuration error: {e:#}");
                return Ok(EXIT_CONFIG);
            }
        };

        let record_id = RecordId::new("scan").map_err(anyhow::Error::msg)?;
        let anonymized = Anonymizer::new(Arc::new(detector)).anonymize_text(&record_id, &text)?;

        println!("🔍 Scan Results:");
        if anonymized.spans.is_empty() {
            println!("  No entities detected");
        }
        for span in &anonymized.spans {
            println!(
                "  - {} at {}..{} (score {:.2})",
                span.entity_type, span.start, span.end, span.score
            );
        }
        println!();
        println!("Anonymized text:");
        println!("{}", anonymized.text);
        println!();

        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_text_with_defaults() {
        let args = ScanArgs {
            text: Some("Email ana@example.com please.".to_string()),
            file: None,
            roster: None,
        };
        let code = args.execute("/nonexistent/ferpa-feedback.toml").await.unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_scan_missing_file_is_fatal() {
        let args = ScanArgs {
            text: None,
            file: Some(PathBuf::from("/nonexistent/comment.txt")),
            roster: None,
        };
        let code = args.execute("/nonexistent/ferpa-feedback.toml").await.unwrap();
        assert_eq!(code, EXIT_FATAL);
    }
}
