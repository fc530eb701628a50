//! Init command implementation
//!
//! Writes a sample configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ferpa-feedback.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing FERPA Feedback configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set FERPA_AUDIT_DIR or edit ferpa.audit_log_path");
                println!("  3. Validate configuration: ferpa-feedback validate-config");
                println!("  4. Try the detector: ferpa-feedback scan --text \"...\"");
                println!("  5. Run a batch: ferpa-feedback process --input records.json --roster roster.json");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Sample configuration with comments
    fn sample_config() -> &'static str {
        r#"# FERPA Feedback Configuration File
#
# Every setting has a default; remove what you do not need.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# development | staging | production
# Production requires ferpa.audit_enabled = true
environment = "development"

# ============================================================================
# Entity Detection
# ============================================================================
[detection]
# Minimum detector confidence (0.0 - 1.0). Kept low on purpose: missing an
# entity is worse than redacting a harmless word.
score_threshold = 0.3

# Optional custom pattern library (TOML)
# pattern_library = "./patterns/custom.toml"

# Redact roster names and their nicknames
use_roster = true

# Lowercase common words that are never treated as names
common_word_exclusions = ["will", "bill", "mark", "grace", "hope", "joy", "faith", "art"]

# ============================================================================
# Name Verification
# ============================================================================
[names]
# Minimum similarity (0 - 100) for an extracted name to count as a match
similarity_threshold = 85

# Optional nickname table (TOML)
# nickname_table = "./patterns/nicknames.toml"

# Primary extractor (roster | capitalized) and fallback
extractor = "roster"
fallback = "capitalized"

# ============================================================================
# Routing Thresholds (0 - 100)
# ============================================================================
[thresholds]
auto_accept = 95
human_review = 80
auto_reject = 50

# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
# Records processed concurrently (1 - 64)
concurrency = 5
grammar_enabled = true
semantic_enabled = true

# ============================================================================
# External Call Retry Policy
# ============================================================================
[retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
timeout_ms = 60000

# ============================================================================
# FERPA Compliance
# ============================================================================
[ferpa]
# Anonymization before any external call cannot be disabled
anonymize_before_api = true
audit_enabled = true
audit_log_path = "${FERPA_AUDIT_DIR}/gate.jsonl"

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = true
local_path = "./logs"

# daily | hourly | never
local_rotation = "daily"
"#
    }
}
