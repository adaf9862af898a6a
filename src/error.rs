//! Error types for srcdeps
//!
//! All modules use `SrcdepsResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for srcdeps operations
pub type SrcdepsResult<T> = Result<T, SrcdepsError>;

/// All errors that can occur in srcdeps
#[derive(Error, Debug)]
pub enum SrcdepsError {
    // Request errors
    #[error("Invalid build request: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Cannot parse '{raw}': {reason}")]
    Parse { raw: String, reason: String },

    // Process errors
    #[error("Command timed out after {}: {command}", format_timeout(.timeout))]
    ProcessTimeout { command: String, timeout: Duration },

    #[error("Command failed: {command}, exit code: {}{}", format_code(.code), format_output(.output))]
    ProcessExit {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to start command: {command}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Store errors
    #[error("Build metadata store failure at {path}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Checkout errors
    #[error("Checkout failed: {reason}")]
    Checkout { reason: String },

    // Configuration file errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn format_timeout(timeout: &Duration) -> String {
    format!("{} ms", timeout.as_millis())
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn format_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{}", output)
    }
}

impl SrcdepsError {
    /// Create a request configuration error
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store IO error for the given path
    pub fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StoreIo {
            path: path.into(),
            source,
        }
    }

    /// Check if the failed attempt may be retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProcessTimeout { .. } | Self::Checkout { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProcessTimeout { .. } => Some("Raise the limit with --timeout-secs or [build] timeout_secs"),
            Self::ProcessSpawn { .. } => Some("Make sure the build tool is installed and on PATH"),
            Self::Parse { .. } => Some("Source versions look like 1.0.0-SRC-revision-<commit>"),
            _ => None,
        }
    }
}
