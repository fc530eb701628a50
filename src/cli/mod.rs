//! CLI interface and argument parsing
//!
//! Exit codes: 0 success, 1 some records failed or were blocked,
//! 2 configuration error, 3 interrupted, 5 fatal.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code: every record routed, nothing blocked
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: some records failed or were blocked by the gate
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration could not be loaded or validated
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: the run was interrupted by a signal
pub const EXIT_INTERRUPTED: i32 = 3;
/// Exit code: unrecoverable error
pub const EXIT_FATAL: i32 = 5;

/// FERPA Feedback - privacy gate for AI-assisted review of teacher comments
#[derive(Parser, Debug)]
#[command(name = "ferpa-feedback")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ferpa-feedback.toml", env = "FERPA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FERPA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of records through the pipeline
    Process(commands::process::ProcessArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Show what would be anonymized in a text, without the originals
    Scan(commands::scan::ScanArgs),

    /// Restore processed records for local human review
    Review(commands::review::ReviewArgs),
}
