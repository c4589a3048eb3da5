//! Smart filter client
//!
//! The filter binary is called once per invocation as
//! `smart-filter <config> <tool> <groups-json>`, with the tool input on stdin.
//! It prints the relevant subset of groups as a JSON object.

use crate::process::{self, ProcessOutcome};
use hookflow_core::{Error, GroupHooks, HookFilter, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "smart filter";

/// Environment flag set for the filter process
pub const ENV_SMART_FILTER_MODE: &str = "SMART_FILTER_MODE";

/// Subprocess-backed [`HookFilter`]
#[derive(Debug, Clone)]
pub struct SmartFilterClient {
    binary: PathBuf,
    config_path: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
}

impl SmartFilterClient {
    /// Client for the filter at `binary`, reading hook config from `config_path`
    pub fn new(binary: PathBuf, config_path: &Path, working_dir: &Path, timeout: Duration) -> Self {
        Self {
            binary,
            config_path: config_path.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        }
    }
}

impl HookFilter for SmartFilterClient {
    #[tracing::instrument(skip(self, groups, tool_input_json), fields(groups = groups.len()))]
    fn filter(
        &self,
        tool_name: &str,
        groups: &GroupHooks,
        tool_input_json: &str,
    ) -> Result<GroupHooks> {
        let groups_json = serde_json::to_string(groups)
            .map_err(|e| Error::auxiliary(SERVICE, format!("cannot encode groups: {e}")))?;

        let expression = duct::cmd(
            &self.binary,
            [
                self.config_path.as_os_str(),
                OsStr::new(tool_name),
                OsStr::new(&groups_json),
            ],
        )
        .dir(&self.working_dir)
        .env(ENV_SMART_FILTER_MODE, "true")
        .stdin_bytes(tool_input_json.as_bytes().to_vec())
        .stdout_capture()
        .stderr_capture();

        let output = match process::run_bounded(expression, Some(self.timeout)) {
            Ok(ProcessOutcome::Exited(output)) => output,
            Ok(ProcessOutcome::TimedOut) => {
                return Err(Error::auxiliary(
                    SERVICE,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
            Err(e) => {
                return Err(Error::auxiliary(
                    SERVICE,
                    format!("failed to run {}: {e}", self.binary.display()),
                ));
            }
        };

        if !output.status.success() {
            return Err(Error::auxiliary(
                SERVICE,
                format!(
                    "exited with {}: {}",
                    output.status,
                    process::lossy(&output.stderr).trim()
                ),
            ));
        }

        let filtered: GroupHooks = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::auxiliary(SERVICE, format!("invalid output: {e}")))?;

        tracing::debug!(selected = filtered.len(), "Smart filter selected groups");
        Ok(filtered)
    }
}
