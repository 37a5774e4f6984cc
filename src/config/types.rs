use std::path::PathBuf;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tokio::sync::Semaphore;

/// One invalid settings field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "concurrency.numTasks")
    pub field_path: String,
    /// What is wrong and how to fix it.
    pub message: String,
}

impl ValidationError {
    /// Creates an error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Failure while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every invalid field found by [`BuildSettings::validate`].
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The settings file exists but cannot be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The settings file is not valid JSON for [`BuildSettings`].
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Renders errors as a numbered list, one per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings of one source directory, read from `.diplomat.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSettings {
    /// Base name (extension stripped) of the outline file.
    pub outline_name: String,

    /// Glob, relative to the source directory, selecting outline and fragment files.
    pub file_pattern: String,

    /// Relative paths resolve against the source directory.
    pub output_dir: PathBuf,

    /// Joins path segments into flat translation keys.
    pub key_separator: String,

    /// Watch-mode coalescing window per source path.
    pub debounce_millis: u64,

    /// Bound of the error stream; errors beyond it are dropped and logged.
    pub error_capacity: usize,

    /// Loader task limits.
    pub concurrency: ConcurrencyConfig,
}

/// Concurrency limits of the reader.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ConcurrencyConfig {
    /// Loader tasks allowed to run at once.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_tasks: Option<usize>,
}

impl ConcurrencyConfig {
    /// Configured task limit, or the CPU-based default.
    #[must_use]
    pub fn effective_tasks(&self) -> usize {
        self.num_tasks
            .unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
            .min(Semaphore::MAX_PERMITS)
    }
}

impl BuildSettings {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }

    /// Checks every field, collecting all problems.
    ///
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Zero-sized window, capacity or concurrency
    /// - Concurrency above the task limit
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.outline_name.is_empty() {
            errors.push(ValidationError::new(
                "outlineName",
                "The outline name cannot be empty. Example: \"diplomat\"",
            ));
        } else if self.outline_name.contains(['/', '\\']) {
            errors.push(ValidationError::new(
                "outlineName",
                format!("'{}' must be a base name, not a path", self.outline_name),
            ));
        }

        if self.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "filePattern",
                "The pattern cannot be empty. Example: \"*.{yaml,yml,json}\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.file_pattern) {
            errors.push(ValidationError::new(
                "filePattern",
                format!("Invalid glob pattern '{}': {e}", self.file_pattern),
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new("outputDir", "The output directory cannot be empty"));
        }

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.debounce_millis == 0 {
            errors.push(ValidationError::new("debounceMillis", "Must be greater than 0"));
        }

        if self.error_capacity == 0 {
            errors.push(ValidationError::new("errorCapacity", "Must be greater than 0"));
        }

        match self.concurrency.num_tasks {
            Some(0) => errors.push(ValidationError::new(
                "concurrency.numTasks",
                "Must be greater than 0, or removed to use the CPU-based default",
            )),
            Some(n) if n > Semaphore::MAX_PERMITS => errors.push(ValidationError::new(
                "concurrency.numTasks",
                format!("Must be at most {}", Semaphore::MAX_PERMITS),
            )),
            _ => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            outline_name: "diplomat".to_string(),
            file_pattern: "*.{yaml,yml,json}".to_string(),
            output_dir: PathBuf::from("build"),
            key_separator: ".".to_string(),
            debounce_millis: 1000,
            error_capacity: 10,
            concurrency: ConcurrencyConfig::default(),
        }
    }
}
