//! Execution results
//!
//! Results are created once a hook terminates (or synthetically for queued
//! background hooks) and never modified afterwards.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Outcome of one hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookExecutionResult {
    /// Hook identifier
    pub hook_name: String,
    /// Group the hook ran in
    pub group_name: String,
    /// `true` exactly when the exit code was zero
    pub success: bool,
    /// Process exit code, `-1` when the process never exited normally
    pub exit_code: i32,
    /// Combined stdout and stderr
    pub output: String,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

/// Exit code recorded for hooks that were killed, never spawned or timed out
pub const ABNORMAL_EXIT: i32 = -1;

impl HookExecutionResult {
    /// Result for a process that exited with `exit_code`
    pub fn exited(
        hook_name: &str,
        group_name: &str,
        exit_code: i32,
        output: String,
        duration: Duration,
    ) -> Self {
        let success = exit_code == 0;
        Self {
            hook_name: hook_name.to_string(),
            group_name: group_name.to_string(),
            success,
            exit_code,
            output,
            error_message: (!success).then(|| format!("exit status {exit_code}")),
            duration_ms: duration_millis(duration),
        }
    }

    /// Failed result with no usable exit status
    pub fn failed(
        hook_name: &str,
        group_name: &str,
        exit_code: i32,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            hook_name: hook_name.to_string(),
            group_name: group_name.to_string(),
            success: false,
            exit_code,
            output: String::new(),
            error_message: Some(error.into()),
            duration_ms: duration_millis(duration),
        }
    }

    /// Successful result with a fixed message
    pub fn succeeded(
        hook_name: &str,
        group_name: &str,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            hook_name: hook_name.to_string(),
            group_name: group_name.to_string(),
            success: true,
            exit_code: 0,
            output: output.into(),
            error_message: None,
            duration_ms: duration_millis(duration),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Totals derived from the result list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    /// Number of results
    pub total_hooks: usize,
    /// Results with `success`
    pub successful_hooks: usize,
    /// Results without `success`
    pub failed_hooks: usize,
    /// Wall time of the whole invocation
    pub total_duration_ms: u64,
    /// Sum of result durations
    pub hook_time_ms: u64,
    /// Groups run in parallel mode
    pub parallel_group_count: usize,
    /// Groups run in sequential mode
    pub sequential_group_count: usize,
}

impl ExecutionStats {
    /// Derive totals from `results`, the group counts and the invocation's
    /// wall time
    pub fn from_results(
        results: &[HookExecutionResult],
        parallel_group_count: usize,
        sequential_group_count: usize,
        elapsed: Duration,
    ) -> Self {
        let successful_hooks = results.iter().filter(|r| r.success).count();
        Self {
            total_hooks: results.len(),
            successful_hooks,
            failed_hooks: results.len() - successful_hooks,
            total_duration_ms: duration_millis(elapsed),
            hook_time_ms: results.iter().map(|r| r.duration_ms).sum(),
            parallel_group_count,
            sequential_group_count,
        }
    }

    /// Invocation wall time divided by the number of hooks
    #[allow(clippy::cast_precision_loss)]
    pub fn average_duration_ms(&self) -> f64 {
        if self.total_hooks == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.total_hooks as f64
        }
    }
}

/// Append-only, mutex-protected result list
///
/// The lock is held only to push. Observers run outside it.
#[derive(Default)]
pub struct ResultLog<'r> {
    results: Mutex<Vec<HookExecutionResult>>,
    observer: Option<&'r (dyn Fn(&HookExecutionResult) + Sync)>,
}

impl<'r> ResultLog<'r> {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty log that calls `observer` for every appended result
    pub fn with_observer(observer: &'r (dyn Fn(&HookExecutionResult) + Sync)) -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            observer: Some(observer),
        }
    }

    /// Append one result
    pub fn push(&self, result: HookExecutionResult) {
        if let Some(observer) = self.observer {
            observer(&result);
        }
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    /// Number of results so far
    pub fn len(&self) -> usize {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no results were recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the results so far
    pub fn snapshot(&self) -> Vec<HookExecutionResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consume the log
    pub fn into_results(self) -> Vec<HookExecutionResult> {
        self.results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResultLog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultLog")
            .field("len", &self.len())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
