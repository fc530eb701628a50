//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, FerpaFeedbackConfig};
use crate::domain::errors::FerpaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env reference pattern is a valid regex")
});

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into [`FerpaFeedbackConfig`]
/// 4. Applies environment variable overrides (FERPA_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Every failure is a [`FerpaError::Configuration`]: a missing or unreadable
/// file, an unset `${VAR}`, malformed TOML (including
/// `anonymize_before_api = false`), an unparsable override, or a failed
/// validation.
///
/// # Examples
///
/// ```no_run
/// use ferpa_feedback::config::loader::load_config;
///
/// let config = load_config("ferpa-feedback.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FerpaFeedbackConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FerpaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FerpaError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration text
pub fn parse_config(contents: &str) -> Result<FerpaFeedbackConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: FerpaFeedbackConfig = toml::from_str(&contents)
        .map_err(|e| FerpaError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        FerpaError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = ENV_REFERENCE.replace_all(line, |cap: &regex::Captures| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(FerpaError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            FerpaError::Configuration(format!("Invalid value for {name}: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using the FERPA_* prefix
///
/// Variables follow the pattern `FERPA_<SECTION>_<KEY>`, for example
/// `FERPA_PIPELINE_CONCURRENCY`.
fn apply_env_overrides(config: &mut FerpaFeedbackConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("FERPA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("FERPA_APPLICATION_ENVIRONMENT") {
        config.application.environment = match val.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(FerpaError::Configuration(format!(
                    "Invalid value for FERPA_APPLICATION_ENVIRONMENT: '{other}'"
                )))
            }
        };
    }

    // Detection and names
    if let Some(val) = env_parse("FERPA_DETECTION_SCORE_THRESHOLD")? {
        config.detection.score_threshold = val;
    }
    if let Some(val) = env_parse("FERPA_NAMES_SIMILARITY_THRESHOLD")? {
        config.names.similarity_threshold = val;
    }

    // Threshold overrides
    if let Some(val) = env_parse("FERPA_THRESHOLDS_AUTO_ACCEPT")? {
        config.thresholds.auto_accept = val;
    }
    if let Some(val) = env_parse("FERPA_THRESHOLDS_HUMAN_REVIEW")? {
        config.thresholds.human_review = val;
    }
    if let Some(val) = env_parse("FERPA_THRESHOLDS_AUTO_REJECT")? {
        config.thresholds.auto_reject = val;
    }

    // Pipeline and retry
    if let Some(val) = env_parse("FERPA_PIPELINE_CONCURRENCY")? {
        config.pipeline.concurrency = val;
    }
    if let Some(val) = env_parse("FERPA_RETRY_MAX_RETRIES")? {
        config.retry.max_retries = val;
    }

    // FERPA overrides
    if let Ok(val) = std::env::var("FERPA_FERPA_AUDIT_LOG_PATH") {
        config.ferpa.audit_log_path = val.into();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("FERPA_LOADER_TEST_VAR", "./audit/test.jsonl");
        let input = "audit_log_path = \"${FERPA_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result.trim_end(), "audit_log_path = \"./audit/test.jsonl\"");
        std::env::remove_var("FERPA_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("FERPA_LOADER_MISSING_VAR");
        let input = "audit_log_path = \"${FERPA_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("FERPA_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# path = \"${FERPA_LOADER_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(FerpaError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[thresholds]
auto_accept = 90
human_review = 75
auto_reject = 40

[pipeline]
concurrency = 8
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.thresholds.auto_accept, 90.0);
        assert_eq!(config.pipeline.concurrency, 8);
    }

    #[test]
    fn test_anonymize_before_api_false_is_rejected() {
        let err = parse_config("[ferpa]\nanonymize_before_api = false\n").unwrap_err();
        assert!(matches!(err, FerpaError::Configuration(_)));
        assert!(err.to_string().contains("cannot be disabled"));
    }
}
