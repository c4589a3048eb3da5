//! Error types for the orchestrator command

use thiserror::Error;

/// Errors that end an orchestrator invocation
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Arguments are well-formed but unusable
    #[error("Usage error: {0}")]
    Usage(String),

    /// The tool input argument is not a JSON object
    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    /// A sequential group stopped the invocation
    #[error("Sequential group '{group}' aborted at hook '{hook}'")]
    SequentialAborted {
        /// Group that failed
        group: String,
        /// First failing hook
        hook: String,
    },

    /// Some hooks failed
    #[error("{failed} of {total} hooks failed")]
    HooksFailed {
        /// Number of failed hooks
        failed: usize,
        /// Number of hooks that ran
        total: usize,
    },

    /// Any other engine error
    #[error(transparent)]
    Engine(hookflow_core::Error),
}

impl From<hookflow_core::Error> for CommandError {
    fn from(err: hookflow_core::Error) -> Self {
        use hookflow_core::Error;

        match err {
            Error::InvalidToolInput(message) => Self::InvalidToolInput(message),
            Error::SequentialGroupFailed { group, hook } => Self::SequentialAborted { group, hook },
            Error::HooksFailed { failed, total } => Self::HooksFailed { failed, total },
            other => Self::Engine(other),
        }
    }
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_hooks_failed_conversion() {
        let error: CommandError = hookflow_core::Error::HooksFailed {
            failed: 2,
            total: 5,
        }
        .into();
        assert!(matches!(error, CommandError::HooksFailed { failed: 2, total: 5 }));
        assert_eq!(error.to_string(), "2 of 5 hooks failed");
    }

    #[test]
    fn test_sequential_abort_conversion() {
        let error: CommandError = hookflow_core::Error::SequentialGroupFailed {
            group: "migrate".into(),
            hook: "h1.sh".into(),
        }
        .into();
        let msg = error.to_string();
        assert!(msg.contains("migrate"));
        assert!(msg.contains("h1.sh"));
    }

    #[test]
    fn test_tool_input_conversion() {
        let error: CommandError = hookflow_core::Error::InvalidToolInput("expected object".into()).into();
        assert!(matches!(error, CommandError::InvalidToolInput(_)));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let error: CommandError = hookflow_core::Error::HookConfig("bad group".into()).into();
        assert!(matches!(error, CommandError::Engine(_)));
        assert!(error.to_string().contains("bad group"));
    }

    #[test]
    fn test_usage_error() {
        let error = CommandError::Usage("hooks directory /nope does not exist".into());
        assert!(error.to_string().starts_with("Usage error"));
    }
}
