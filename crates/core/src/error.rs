//! Base error types for hookflow
//!
//! This module provides the foundation error types that all crates can use.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The hooks configuration document could not be read
    #[error("Failed to read hooks configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The hooks configuration document is not valid JSON for the expected shape
    #[error("Failed to parse hooks configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Hook configuration error
    #[error("Hook configuration error: {0}")]
    HookConfig(String),

    /// Hook execution error
    #[error("Hook execution error: {0}")]
    HookExecution(String),

    /// A hook in a sequential group failed, aborting the invocation
    #[error("Sequential group '{group}' aborted: hook '{hook}' failed")]
    SequentialGroupFailed { group: String, hook: String },

    /// One or more hooks failed during the invocation
    #[error("{failed} of {total} hooks failed")]
    HooksFailed { failed: usize, total: usize },

    /// Smart filter, cache or queue service failure
    #[error("{service} unavailable: {message}")]
    AuxiliaryService {
        service: &'static str,
        message: String,
    },

    /// Profiler snapshot persistence error
    #[error("Profiler persistence error: {0}")]
    Persistence(String),

    /// Tool input payload is not a JSON object
    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Shorthand for an auxiliary service failure
    pub fn auxiliary(service: &'static str, message: impl Into<String>) -> Self {
        Self::AuxiliaryService {
            service,
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_sequential_group_failed_message() {
        let err = Error::SequentialGroupFailed {
            group: "migrate".to_string(),
            hook: "h1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sequential group 'migrate' aborted: hook 'h1' failed"
        );
    }

    #[test]
    fn test_auxiliary_shorthand() {
        let err = Error::auxiliary("smart filter", "binary missing");
        assert_eq!(err.to_string(), "smart filter unavailable: binary missing");
    }

    #[test]
    fn test_config_parse_includes_path() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::ConfigParse {
            path: PathBuf::from("/tmp/groups.json"),
            source,
        };
        assert!(err.to_string().contains("/tmp/groups.json"));
    }
}
