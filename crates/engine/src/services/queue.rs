//! Background queue client
//!
//! Each hook is handed to the enqueue script as
//! `enqueue-hook.sh <hook> <tool-input-json> <priority>`.

use crate::hooks::HookCommand;
use crate::process::{self, ProcessOutcome};
use hookflow_core::{BackgroundQueue, Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "background queue";

/// Environment flag set for the enqueue process
pub const ENV_BACKGROUND_ENQUEUE: &str = "BACKGROUND_ENQUEUE";

/// Subprocess-backed [`BackgroundQueue`]
#[derive(Debug, Clone)]
pub struct BackgroundQueueClient {
    command: HookCommand,
    working_dir: PathBuf,
    timeout: Duration,
}

impl BackgroundQueueClient {
    /// Client for the enqueue program at `program`
    pub fn new(program: PathBuf, working_dir: &Path, timeout: Duration) -> Self {
        Self {
            command: HookCommand::from_path(program),
            working_dir: working_dir.to_path_buf(),
            timeout,
        }
    }
}

impl BackgroundQueue for BackgroundQueueClient {
    fn enqueue(&self, hook_name: &str, tool_input_json: &str, priority: u8) -> Result<()> {
        let args: Vec<OsString> = vec![
            hook_name.into(),
            tool_input_json.into(),
            priority.to_string().into(),
        ];
        let expression = self
            .command
            .expression_with(args)
            .dir(&self.working_dir)
            .env(ENV_BACKGROUND_ENQUEUE, "true")
            .stderr_to_stdout()
            .stdout_capture();

        match process::run_bounded(expression, Some(self.timeout)) {
            Ok(ProcessOutcome::Exited(output)) if output.status.success() => Ok(()),
            Ok(ProcessOutcome::Exited(output)) => Err(Error::auxiliary(
                SERVICE,
                format!(
                    "{} ({})",
                    output.status,
                    process::lossy(&output.stdout).trim()
                ),
            )),
            Ok(ProcessOutcome::TimedOut) => Err(Error::auxiliary(
                SERVICE,
                format!("timed out after {:?}", self.timeout),
            )),
            Err(e) => Err(Error::auxiliary(
                SERVICE,
                format!("failed to run {}: {e}", self.command.path().display()),
            )),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::fs;

    #[test]
    fn test_enqueue_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("queue.log");
        let script = dir.path().join("enqueue-hook.sh");
        fs::write(
            &script,
            format!(
                "echo \"$1|$2|$3|$BACKGROUND_ENQUEUE\" >> {}\n",
                log.display()
            ),
        )
        .unwrap();

        let queue = BackgroundQueueClient::new(script, dir.path(), Duration::from_secs(5));
        queue.enqueue("log-activity.sh", r#"{"a":1}"#, 6).unwrap();

        let line = fs::read_to_string(&log).unwrap();
        assert_eq!(line.trim(), r#"log-activity.sh|{"a":1}|6|true"#);
    }

    #[test]
    fn test_enqueue_failure() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("enqueue-hook.sh");
        fs::write(&script, "echo queue full\nexit 4\n").unwrap();

        let queue = BackgroundQueueClient::new(script, dir.path(), Duration::from_secs(5));
        let err = queue.enqueue("notify.sh", "{}", 5).unwrap_err();
        assert!(err.to_string().contains("queue full"));
    }

    #[test]
    fn test_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let queue = BackgroundQueueClient::new(
            dir.path().join("enqueue-hook.sh"),
            dir.path(),
            Duration::from_secs(5),
        );
        assert!(queue.enqueue("notify.sh", "{}", 5).is_err());
    }
}
