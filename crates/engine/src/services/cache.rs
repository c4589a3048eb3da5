//! Shared cache client
//!
//! Talks to the cache service through its integration script:
//!
//! - `warm-git`
//! - `warm-files <dir>`
//! - `invalidate-git`
//! - `invalidate-file <path>`

use crate::hooks::HookCommand;
use crate::process::{self, ProcessOutcome};
use hookflow_core::{CacheService, Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "cache";

/// Subprocess-backed [`CacheService`]
#[derive(Debug, Clone)]
pub struct CacheClient {
    script: PathBuf,
    command: HookCommand,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CacheClient {
    /// Client for the integration script at `script`
    pub fn new(script: PathBuf, working_dir: &Path, timeout: Duration) -> Self {
        Self {
            command: HookCommand::from_path(script.clone()),
            script,
            working_dir: working_dir.to_path_buf(),
            timeout,
        }
    }

    fn call(&self, subcommand: &str, arg: Option<&Path>) -> Result<()> {
        let mut args = vec![OsString::from(subcommand)];
        args.extend(arg.map(|a| a.as_os_str().to_os_string()));

        let expression = self
            .command
            .expression_with(args)
            .dir(&self.working_dir)
            .stdout_capture()
            .stderr_capture();

        match process::run_bounded(expression, Some(self.timeout)) {
            Ok(ProcessOutcome::Exited(output)) if output.status.success() => {
                tracing::debug!(subcommand, "Cache call succeeded");
                Ok(())
            }
            Ok(ProcessOutcome::Exited(output)) => Err(Error::auxiliary(
                SERVICE,
                format!(
                    "{subcommand} exited with {}: {}",
                    output.status,
                    process::lossy(&output.stderr).trim()
                ),
            )),
            Ok(ProcessOutcome::TimedOut) => Err(Error::auxiliary(
                SERVICE,
                format!("{subcommand} timed out after {:?}", self.timeout),
            )),
            Err(e) => Err(Error::auxiliary(
                SERVICE,
                format!("failed to run {}: {e}", self.script.display()),
            )),
        }
    }
}

impl CacheService for CacheClient {
    fn is_enabled(&self) -> bool {
        self.script.is_file()
    }

    fn endpoint(&self) -> Option<&Path> {
        self.is_enabled().then_some(self.script.as_path())
    }

    fn warm_git(&self) -> Result<()> {
        self.call("warm-git", None)
    }

    fn warm_files(&self, root: &Path) -> Result<()> {
        self.call("warm-files", Some(root))
    }

    fn invalidate_git(&self) -> Result<()> {
        self.call("invalidate-git", None)
    }

    fn invalidate_file(&self, path: &Path) -> Result<()> {
        self.call("invalidate-file", Some(path))
    }
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::fs;

    fn client(dir: &Path, body: &str) -> CacheClient {
        let script = dir.join("cache-integration.sh");
        fs::write(&script, body).unwrap();
        CacheClient::new(script, dir, Duration::from_secs(5))
    }

    #[test]
    fn test_subcommands_reach_script() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let cache = client(
            dir.path(),
            &format!("echo \"$*\" >> {}\n", log.display()),
        );

        cache.warm_git().unwrap();
        cache.warm_files(Path::new(".")).unwrap();
        cache.invalidate_git().unwrap();
        cache.invalidate_file(Path::new("src/lib.rs")).unwrap();

        let calls = fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(
            lines,
            vec![
                "warm-git",
                "warm-files .",
                "invalidate-git",
                "invalidate-file src/lib.rs"
            ]
        );
    }

    #[test]
    fn test_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cache = client(dir.path(), "echo broken >&2\nexit 1\n");
        let err = cache.invalidate_git().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_missing_script_disables_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheClient::new(
            dir.path().join("cache-integration.sh"),
            dir.path(),
            Duration::from_secs(1),
        );
        assert!(!cache.is_enabled());
        assert!(cache.endpoint().is_none());
        assert!(cache.warm_git().is_err());
    }
}
