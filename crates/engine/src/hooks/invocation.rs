//! Single hook invocation
//!
//! Launches one hook process with the orchestrator environment, feeds it the
//! tool payload on stdin, bounds it by a deadline and times it with the
//! profiler.

use super::command::HookCommand;
use super::result::{ABNORMAL_EXIT, HookExecutionResult};
use super::tool::ToolContext;
use crate::process::{self, ProcessOutcome};
use crate::profiler::{HookProfiler, MetricStatus};
use hookflow_config::ExecutionMode;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Environment variable carrying the group name
pub const ENV_HOOK_GROUP: &str = "HOOK_GROUP";
/// Environment variable carrying the parallel-mode flag
pub const ENV_PARALLEL_MODE: &str = "PARALLEL_MODE";
/// Environment variable carrying the cache-enabled flag
pub const ENV_CACHE_ENABLED: &str = "CACHE_ENABLED";
/// Environment variable carrying the cache endpoint
pub const ENV_CACHE_SCRIPT: &str = "CACHE_INTEGRATION_SCRIPT";

/// Launches hooks for one orchestrator invocation
///
/// Everything that is identical across hooks (working directory, cache
/// environment, stdin payload) is prepared once.
#[derive(Debug, Clone)]
pub struct HookInvoker {
    working_dir: PathBuf,
    /// Shared environment variables (Arc to avoid cloning for each hook)
    env_vars: Arc<IndexMap<&'static str, String>>,
    payload: Arc<Vec<u8>>,
    tool_name: Option<String>,
    profiler: Arc<HookProfiler>,
    /// Configured deadline named in timeout messages
    group_timeout: Option<Duration>,
}

impl HookInvoker {
    /// Prepare an invoker
    ///
    /// `cache_endpoint` is `None` when no cache service is available.
    pub fn new(
        working_dir: &Path,
        cache_endpoint: Option<&Path>,
        tool: &ToolContext,
        profiler: Arc<HookProfiler>,
    ) -> Self {
        let mut env_vars = IndexMap::new();
        env_vars.insert(ENV_CACHE_ENABLED, cache_endpoint.is_some().to_string());
        env_vars.insert(
            ENV_CACHE_SCRIPT,
            cache_endpoint
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );

        Self {
            working_dir: working_dir.to_path_buf(),
            env_vars: Arc::new(env_vars),
            payload: Arc::new(tool.hook_payload().to_string().into_bytes()),
            tool_name: tool.tool_name().map(str::to_string),
            profiler,
            group_timeout: None,
        }
    }

    /// Report timeouts against the configured deadline rather than the time
    /// left when the hook started
    #[must_use]
    pub fn with_group_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.group_timeout = timeout;
        self
    }

    /// The profiler samples are recorded into
    pub fn profiler(&self) -> &HookProfiler {
        &self.profiler
    }

    /// Run one hook and produce its result
    ///
    /// Never fails: spawn errors and timeouts become failed results.
    #[tracing::instrument(
        name = "hook",
        skip_all,
        fields(hook = %hook_name, group = %group_name, mode = %mode)
    )]
    pub fn invoke(
        &self,
        hook_name: &str,
        command: &HookCommand,
        group_name: &str,
        mode: ExecutionMode,
        timeout: Option<Duration>,
    ) -> HookExecutionResult {
        let mut timer = self.profiler.start_timer(hook_name);
        timer.set_custom_metric("group", group_name);
        timer.set_custom_metric("execution_mode", mode.name());
        if let Some(tool) = &self.tool_name {
            timer.set_custom_metric("tool_name", tool.as_str());
        }

        let started = Instant::now();
        tracing::debug!(program = %command.path().display(), "Starting hook");

        let result = match process::run_bounded(self.expression(command, group_name, mode), timeout) {
            Ok(ProcessOutcome::Exited(output)) => {
                let exit_code = output.status.code().unwrap_or(ABNORMAL_EXIT);
                HookExecutionResult::exited(
                    hook_name,
                    group_name,
                    exit_code,
                    process::lossy(&output.stdout),
                    started.elapsed(),
                )
            }
            Ok(ProcessOutcome::TimedOut) => HookExecutionResult::failed(
                hook_name,
                group_name,
                ABNORMAL_EXIT,
                format!(
                    "timed out after {:.1}s",
                    self.group_timeout.or(timeout).unwrap_or_default().as_secs_f64()
                ),
                started.elapsed(),
            ),
            Err(e) => HookExecutionResult::failed(
                hook_name,
                group_name,
                ABNORMAL_EXIT,
                format!("failed to start {}: {e}", command.path().display()),
                started.elapsed(),
            ),
        };

        timer.set_custom_metric("exit_code", result.exit_code);
        if result.success {
            timer.stop(MetricStatus::Success, None);
            tracing::debug!(elapsed_ms = result.duration_ms, "Hook completed successfully");
        } else {
            timer.stop(MetricStatus::Error, result.error_message.clone());
            tracing::debug!(
                elapsed_ms = result.duration_ms,
                exit_code = result.exit_code,
                error = result.error_message.as_deref().unwrap_or_default(),
                "Hook failed"
            );
        }

        result
    }

    /// Record a hook that was never started because its deadline had passed
    pub fn expired(&self, hook_name: &str, group_name: &str) -> HookExecutionResult {
        self.profiler
            .start_timer(hook_name)
            .stop(MetricStatus::Error, Some("deadline exceeded before start".to_string()));
        HookExecutionResult::failed(
            hook_name,
            group_name,
            ABNORMAL_EXIT,
            "timed out before start (group deadline exceeded)",
            Duration::ZERO,
        )
    }

    fn expression(&self, command: &HookCommand, group_name: &str, mode: ExecutionMode) -> duct::Expression {
        let mut expression = command
            .expression()
            .dir(&self.working_dir)
            .stdin_bytes(self.payload.as_slice().to_vec())
            .stderr_to_stdout()
            .stdout_capture()
            .env(ENV_HOOK_GROUP, group_name)
            .env(ENV_PARALLEL_MODE, mode.is_parallel().to_string());

        for (key, value) in self.env_vars.iter() {
            expression = expression.env(key, value);
        }

        expression
    }
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::fs;

    fn invoker(dir: &Path, tool: &ToolContext) -> HookInvoker {
        HookInvoker::new(dir, None, tool, Arc::new(HookProfiler::new(100)))
    }

    fn script(dir: &Path, name: &str, body: &str) -> HookCommand {
        fs::write(dir.join(name), body).unwrap();
        HookCommand::resolve(dir, name)
    }

    #[test]
    fn test_success_captures_combined_output() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(dir.path(), "ok.sh", "echo out\necho err >&2\nexit 0\n");
        let result = invoker(dir.path(), &ToolContext::new()).invoke(
            "ok.sh",
            &command,
            "lint",
            ExecutionMode::Parallel,
            Some(Duration::from_secs(5)),
        );
        assert!(result.success);
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
        assert_eq!(result.group_name, "lint");
    }

    #[test]
    fn test_environment_and_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(
            dir.path(),
            "env.sh",
            "echo \"$HOOK_GROUP|$PARALLEL_MODE|$CACHE_ENABLED\"\ncat\n",
        );
        let tool = ToolContext::new().with_matcher("Write").with_field("file_path", "a.rs");
        let result = invoker(dir.path(), &tool).invoke(
            "env.sh",
            &command,
            "security",
            ExecutionMode::Sequential,
            None,
        );
        assert!(result.success);
        assert!(result.output.contains("security|false|false"));
        assert!(result.output.contains(r#""tool_name":"Write""#));
        assert!(result.output.contains(r#""file_path":"a.rs""#));
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(dir.path(), "fail.sh", "exit 3\n");
        let inv = invoker(dir.path(), &ToolContext::new());
        let result = inv.invoke("fail.sh", &command, "g", ExecutionMode::Parallel, None);
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);

        let agg = inv.profiler().aggregated("fail.sh").unwrap();
        assert_eq!(agg.failed_runs, 1);
    }

    #[test]
    fn test_missing_native_executable_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = HookCommand::resolve(dir.path(), "absent-binary");
        let result = invoker(dir.path(), &ToolContext::new()).invoke(
            "absent-binary",
            &command,
            "g",
            ExecutionMode::Parallel,
            None,
        );
        assert!(!result.success);
        assert_eq!(result.exit_code, ABNORMAL_EXIT);
        assert!(result.error_message.unwrap().contains("failed to start"));
    }

    #[test]
    fn test_timeout_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(dir.path(), "slow.sh", "exec sleep 5\n");
        let result = invoker(dir.path(), &ToolContext::new()).invoke(
            "slow.sh",
            &command,
            "g",
            ExecutionMode::Parallel,
            Some(Duration::from_millis(200)),
        );
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("timed out"));
    }

    #[test]
    fn test_timeout_names_configured_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(dir.path(), "slow.sh", "exec sleep 5\n");
        let result = invoker(dir.path(), &ToolContext::new())
            .with_group_timeout(Some(Duration::from_secs(30)))
            .invoke(
                "slow.sh",
                &command,
                "g",
                ExecutionMode::Parallel,
                Some(Duration::from_millis(200)),
            );
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("timed out after 30.0s"));
    }

    #[test]
    fn test_profiler_tags() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(dir.path(), "tag.sh", "exit 0\n");
        let tool = ToolContext::new().with_field("tool", "Bash");
        let inv = invoker(dir.path(), &tool);
        inv.invoke("tag.sh", &command, "lint", ExecutionMode::Parallel, None);

        let sample = &inv.profiler().get_metrics("tag.sh", 1)[0];
        assert_eq!(sample.custom_metrics["group"], "lint");
        assert_eq!(sample.custom_metrics["execution_mode"], "parallel");
        assert_eq!(sample.custom_metrics["tool_name"], "Bash");
    }
}
