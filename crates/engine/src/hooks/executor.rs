//! Group execution strategies
//!
//! - [`ParallelGroupExecutor`]: fans hooks out on a worker pool sized to the
//!   group's `max_concurrent`, under a group-wide deadline.
//! - [`SequentialGroupExecutor`]: one hook at a time, stopping at the first failure.
//! - [`BackgroundDispatcher`]: hands hooks to the background queue without waiting.
//!
//! All three append to the same [`ResultLog`] as soon as each hook is done.

use super::command::{HookCatalog, HookCommand};
use super::invocation::HookInvoker;
use super::result::{ABNORMAL_EXIT, HookExecutionResult, ResultLog};
use super::tool::ToolContext;
use hookflow_config::{ExecutionMode, HookGroupConfig};
use hookflow_core::{BackgroundQueue, CacheService, Error, Result};
use std::time::{Duration, Instant};

/// Default background queue priority
pub const DEFAULT_QUEUE_PRIORITY: u8 = 5;

/// Output recorded for a successfully enqueued hook
pub const ENQUEUED_MESSAGE: &str = "Enqueued for background execution";

/// Shared state for executing the groups of one invocation
pub struct ExecutionContext<'a> {
    /// Resolved hook programs
    pub catalog: &'a HookCatalog,
    /// Hook launcher
    pub invoker: &'a HookInvoker,
    /// Cache service invalidated after hooks with side effects
    pub cache: &'a dyn CacheService,
    /// Triggering tool event
    pub tool: &'a ToolContext,
    /// Where results are appended
    pub results: &'a ResultLog<'a>,
    /// Parallel group deadline and sequential per-hook bound
    pub timeout: Option<Duration>,
}

impl ExecutionContext<'_> {
    fn command(&self, hook_name: &str) -> Option<&HookCommand> {
        self.catalog.get(hook_name)
    }

    fn unresolved(&self, hook_name: &str, group: &HookGroupConfig) -> HookExecutionResult {
        HookExecutionResult::failed(
            hook_name,
            &group.name,
            ABNORMAL_EXIT,
            format!("hook '{hook_name}' is not in the resolved catalog"),
            Duration::ZERO,
        )
    }

    /// Run one hook, then invalidate any cache it may have made stale
    fn run_hook(
        &self,
        hook_name: &str,
        group: &HookGroupConfig,
        timeout: Option<Duration>,
    ) -> HookExecutionResult {
        let result = match self.command(hook_name) {
            Some(command) => {
                self.invoker
                    .invoke(hook_name, command, &group.name, group.mode, timeout)
            }
            None => self.unresolved(hook_name, group),
        };
        invalidate_side_effects(self.cache, hook_name, self.tool);
        result
    }
}

/// Whether a hook name implies git side effects
pub fn touches_git(hook_name: &str) -> bool {
    let name = hook_name.to_lowercase();
    name.contains("git") || name.contains("commit")
}

/// Whether a hook name implies file writes
pub fn touches_files(hook_name: &str) -> bool {
    let name = hook_name.to_lowercase();
    name.contains("write") || name.contains("edit")
}

/// Invalidate caches according to the hook's declared side effects
///
/// Failures are logged and otherwise ignored.
pub fn invalidate_side_effects(cache: &dyn CacheService, hook_name: &str, tool: &ToolContext) {
    if !cache.is_enabled() {
        return;
    }

    if touches_git(hook_name)
        && let Err(e) = cache.invalidate_git()
    {
        tracing::warn!(hook = hook_name, "Git cache invalidation failed: {}", e);
    }

    if touches_files(hook_name)
        && let Some(path) = tool.file_path()
        && let Err(e) = cache.invalidate_file(&path)
    {
        tracing::warn!(hook = hook_name, "File cache invalidation failed: {}", e);
    }
}

/// Runs a parallel group with bounded concurrency
///
/// The pool has exactly `max_concurrent` workers, so at most that many hooks
/// hold a worker (and run) at once. Hooks are picked up in list order. A hook that reaches a worker after the
/// group deadline is recorded as a timeout without being started; one still
/// running at the deadline is killed.
pub struct ParallelGroupExecutor<'c, 'a> {
    ctx: &'c ExecutionContext<'a>,
}

impl<'c, 'a> ParallelGroupExecutor<'c, 'a> {
    /// Executor bound to `ctx`
    pub fn new(ctx: &'c ExecutionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run every hook of `group` and wait for all of them
    ///
    /// Hook failures are recorded, never returned. An error means the worker
    /// pool itself could not be created.
    #[tracing::instrument(skip_all, fields(group = %group.name, hooks = group.hooks.len(), max_concurrent = group.max_concurrent))]
    pub fn run(&self, group: &HookGroupConfig) -> Result<()> {
        if group.hooks.is_empty() {
            return Ok(());
        }

        let permits = group.max_concurrent.clamp(1, group.hooks.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(permits)
            .thread_name(|i| format!("hook-worker-{i}"))
            .build()
            .map_err(|e| {
                Error::HookExecution(format!(
                    "Failed to create worker pool for group '{}': {e}",
                    group.name
                ))
            })?;

        let deadline = self.ctx.timeout.map(|t| Instant::now() + t);
        tracing::debug!(permits, "Executing hooks in parallel");

        pool.scope_fifo(|scope| {
            for hook_name in &group.hooks {
                scope.spawn_fifo(move |_| {
                    let result = match remaining(deadline) {
                        Some(left) if left.is_zero() => {
                            self.ctx.invoker.expired(hook_name, &group.name)
                        }
                        timeout => self.ctx.run_hook(hook_name, group, timeout),
                    };
                    self.ctx.results.push(result);
                });
            }
        });

        Ok(())
    }
}

/// Time left until `deadline`; `None` when there is no deadline
fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(Instant::now()))
}

/// Runs a sequential group, stopping at the first failure
pub struct SequentialGroupExecutor<'c, 'a> {
    ctx: &'c ExecutionContext<'a>,
}

impl<'c, 'a> SequentialGroupExecutor<'c, 'a> {
    /// Executor bound to `ctx`
    pub fn new(ctx: &'c ExecutionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run the hooks of `group` in order
    ///
    /// Returns [`Error::SequentialGroupFailed`] for the first failing hook;
    /// later hooks are not started.
    #[tracing::instrument(skip_all, fields(group = %group.name, hooks = group.hooks.len()))]
    pub fn run(&self, group: &HookGroupConfig) -> Result<()> {
        for hook_name in &group.hooks {
            let result = self.ctx.run_hook(hook_name, group, self.ctx.timeout);
            let success = result.success;
            self.ctx.results.push(result);

            if !success {
                tracing::debug!(hook = %hook_name, "Stopping sequential group after failure");
                return Err(Error::SequentialGroupFailed {
                    group: group.name.clone(),
                    hook: hook_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Background queue priority for a hook
///
/// Logging hooks are less urgent than the default, error reporters more urgent.
pub fn queue_priority(hook_name: &str) -> u8 {
    if hook_name.contains("log-") {
        DEFAULT_QUEUE_PRIORITY + 1
    } else if hook_name.contains("error-") {
        DEFAULT_QUEUE_PRIORITY - 1
    } else {
        DEFAULT_QUEUE_PRIORITY
    }
}

/// Hands background-eligible groups to the queue
pub struct BackgroundDispatcher<'q> {
    queue: &'q dyn BackgroundQueue,
}

impl<'q> BackgroundDispatcher<'q> {
    /// Dispatcher using `queue`
    pub fn new(queue: &'q dyn BackgroundQueue) -> Self {
        Self { queue }
    }

    /// Enqueue every hook of `group` and record a result for each
    ///
    /// An enqueue failure becomes a failed result; the remaining hooks are
    /// still enqueued.
    #[tracing::instrument(skip_all, fields(group = %group.name, hooks = group.hooks.len()))]
    pub fn dispatch(&self, group: &HookGroupConfig, tool: &ToolContext, results: &ResultLog<'_>) {
        let input_json = tool.input_json();

        for hook_name in &group.hooks {
            let priority = queue_priority(hook_name);
            let started = Instant::now();
            let result = match self.queue.enqueue(hook_name, &input_json, priority) {
                Ok(()) => {
                    tracing::debug!(hook = %hook_name, priority, "Enqueued hook");
                    HookExecutionResult::succeeded(
                        hook_name,
                        &group.name,
                        ENQUEUED_MESSAGE,
                        started.elapsed(),
                    )
                }
                Err(e) => {
                    tracing::warn!(hook = %hook_name, "Background enqueue failed: {}", e);
                    HookExecutionResult::failed(
                        hook_name,
                        &group.name,
                        1,
                        format!("Failed to enqueue: {e}"),
                        started.elapsed(),
                    )
                }
            };
            results.push(result);
        }
    }
}

/// Group execution strategy chosen from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStrategy {
    /// Hand off to the background queue
    Background,
    /// Run with a [`ParallelGroupExecutor`]
    Parallel,
    /// Run with a [`SequentialGroupExecutor`]
    Sequential,
}

impl GroupStrategy {
    /// Pick the strategy for `group`
    pub fn for_group(group: &HookGroupConfig) -> Self {
        if group.background_eligible {
            Self::Background
        } else {
            match group.mode {
                ExecutionMode::Parallel => Self::Parallel,
                ExecutionMode::Sequential => Self::Sequential,
            }
        }
    }
}
