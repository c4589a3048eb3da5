//! Subprocess execution with an optional deadline

use std::io;
use std::process::Output;
use std::time::Duration;

/// How a bounded subprocess run ended
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited on its own
    Exited(Output),
    /// The deadline passed and the process was killed
    TimedOut,
}

impl ProcessOutcome {
    /// Exit code, `None` for timeouts and signal deaths
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited(output) => output.status.code(),
            Self::TimedOut => None,
        }
    }
}

/// Run `expression` to completion or until `timeout` elapses
///
/// Non-zero exit codes are not errors here; the caller inspects the status.
/// An `Err` means the process could not be started or waited on.
pub fn run_bounded(expression: duct::Expression, timeout: Option<Duration>) -> io::Result<ProcessOutcome> {
    let handle = expression.unchecked().start()?;

    let Some(timeout) = timeout else {
        return handle.wait().map(|output| ProcessOutcome::Exited(output.clone()));
    };

    match handle.wait_timeout(timeout)? {
        Some(output) => Ok(ProcessOutcome::Exited(output.clone())),
        None => {
            handle.kill()?;
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

/// Lossy UTF-8 view of captured bytes
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_exit_code_reported() {
        let outcome = run_bounded(duct::cmd!("sh", "-c", "exit 4"), None).unwrap();
        assert_eq!(outcome.exit_code(), Some(4));
    }

    #[test]
    fn test_stdout_captured() {
        let expr = duct::cmd!("sh", "-c", "echo hello").stdout_capture();
        let ProcessOutcome::Exited(output) = run_bounded(expr, Some(Duration::from_secs(5))).unwrap()
        else {
            panic!("expected exit");
        };
        assert_eq!(lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn test_timeout_kills() {
        let expr = duct::cmd!("sh", "-c", "exec sleep 5");
        let started = std::time::Instant::now();
        let outcome = run_bounded(expr, Some(Duration::from_millis(100))).unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program_is_error() {
        let err = run_bounded(duct::cmd("/nonexistent/program", Vec::<String>::new()), None);
        assert!(err.is_err());
    }
}
