//! Validate config command implementation

use crate::cli::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {}", config.application.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Detection Score Threshold: {}", config.detection.score_threshold);
        println!(
            "  Pattern Library: {}",
            config
                .detection
                .pattern_library
                .as_ref()
                .map_or("built-in".to_string(), |p| p.display().to_string())
        );
        println!("  Roster Detection: {}", config.detection.use_roster);
        println!("  Name Extractor: {}", config.names.extractor.label());
        if let Some(fallback) = config.names.fallback {
            println!("  Fallback Extractor: {}", fallback.label());
        }
        println!("  Name Similarity Threshold: {}", config.names.similarity_threshold);
        println!(
            "  Thresholds: accept >= {}, review >= {}, reject < {}",
            config.thresholds.auto_accept,
            config.thresholds.human_review,
            config.thresholds.auto_reject
        );
        println!("  Concurrency: {}", config.pipeline.concurrency);
        println!("  Grammar Check: {}", config.pipeline.grammar_enabled);
        println!("  Semantic Analysis: {}", config.pipeline.semantic_enabled);
        println!(
            "  Retries: {} (timeout {}ms)",
            config.retry.max_retries, config.retry.timeout_ms
        );
        println!("  Anonymize Before API: always");
        if config.ferpa.audit_enabled {
            println!("  Audit Log: {}", config.ferpa.audit_log_path.display());
        } else {
            println!("  Audit Log: disabled");
        }
        println!();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nconcurrency = 2").unwrap();
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nauto_accept = 40\nauto_reject = 60").unwrap();
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
