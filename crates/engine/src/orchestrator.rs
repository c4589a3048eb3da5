//! Hook orchestrator
//!
//! Composition root for one invocation. [`OrchestratorBuilder::build`] loads the
//! hooks document, resolves every hook's execution form and prepares the
//! auxiliary services. [`Orchestrator::execute_hooks`] then narrows the groups
//! through the smart filter, orders them by priority and runs each one with
//! its strategy.
//!
//! ## Failure handling
//!
//! - Configuration errors fail [`OrchestratorBuilder::build`], before any hook runs
//! - A failing sequential group stops the invocation; later groups are skipped
//! - Parallel and background failures are recorded and never stop siblings
//! - Cache, filter and queue problems are logged as warnings and worked around

use crate::hooks::result::ABNORMAL_EXIT;
use crate::hooks::{
    BackgroundDispatcher, ExecutionContext, ExecutionStats, GroupStrategy, HookCatalog,
    HookExecutionResult, HookInvoker, ParallelGroupExecutor, ResultLog, SequentialGroupExecutor,
    ToolContext, UNKNOWN_TOOL,
};
use crate::profiler::{AggregatedMetrics, HookProfiler};
use crate::services::{AuxBinary, BackgroundQueueClient, CacheClient, SmartFilterClient};
use hookflow_config::{
    ExecutionMode, HookGroupConfig, HooksConfig, OrchestratorSettings, ParallelizationConfig,
};
use hookflow_core::{BackgroundQueue, CacheService, Error, GroupHooks, HookFilter, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of slowest hooks listed in the invocation summary
pub const SUMMARY_SLOWEST_HOOKS: usize = 3;

/// Receives progress while an invocation runs
///
/// [`ResultReporter::hook_finished`] is called from worker threads as soon as
/// each result lands; the other callbacks run on the orchestrator's thread.
pub trait ResultReporter: Sync {
    /// Invocation begins with the loaded parallelization settings
    fn invocation_started(&self, _config: &ParallelizationConfig) {}

    /// Nothing is left to run after filtering
    fn nothing_to_run(&self, _tool_name: &str) {}

    /// A group is about to run
    fn group_started(&self, _group: &HookGroupConfig, _strategy: GroupStrategy) {}

    /// One hook has a result
    fn hook_finished(&self, result: &HookExecutionResult);

    /// Every group has run (or the invocation was aborted)
    fn invocation_finished(&self, _summary: &InvocationSummary) {}
}

/// Reporter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl ResultReporter for NoOpReporter {
    fn hook_finished(&self, _result: &HookExecutionResult) {}
}

/// End-of-invocation figures handed to [`ResultReporter::invocation_finished`]
#[derive(Debug, Clone)]
pub struct InvocationSummary {
    /// Totals over the result list
    pub stats: ExecutionStats,
    /// Wall time of the whole invocation
    pub elapsed: Duration,
    /// Configured `max_concurrent_groups`
    pub max_concurrent_groups: usize,
    /// Slowest hooks by average time, from the profiler
    pub slowest: Vec<AggregatedMetrics>,
}

/// Everything one invocation produced
#[derive(Debug)]
pub struct ExecutionReport {
    /// Results in completion order
    pub results: Vec<HookExecutionResult>,
    /// Totals over `results`
    pub stats: ExecutionStats,
    /// Wall time of the whole invocation
    pub elapsed: Duration,
    /// Set when a sequential group stopped the invocation
    pub aborted: Option<Error>,
}

impl ExecutionReport {
    /// Whether any hook failed
    pub fn has_failures(&self) -> bool {
        self.stats.failed_hooks > 0
    }

    /// Turn the report into the invocation's final outcome
    ///
    /// A sequential abort wins over the failed-hook count.
    pub fn into_result(self) -> Result<Self> {
        if let Some(error) = self.aborted {
            return Err(error);
        }
        if self.has_failures() {
            return Err(Error::HooksFailed {
                failed: self.stats.failed_hooks,
                total: self.stats.total_hooks,
            });
        }
        Ok(self)
    }
}

enum FilterChoice {
    Default,
    Custom(Arc<dyn HookFilter>),
    Disabled,
}

/// Builder for [`Orchestrator`]
///
/// Every service defaults to the subprocess client found in the hooks
/// directory. Tests and embedders can substitute their own.
///
/// # Examples
///
/// ```ignore
/// let orchestrator = Orchestrator::builder(settings)
///     .profiler(profiler)
///     .build()?;
/// orchestrator.execute_hooks(&tool, &reporter)?;
/// ```
pub struct OrchestratorBuilder {
    settings: OrchestratorSettings,
    profiler: Option<Arc<HookProfiler>>,
    cache: Option<Arc<dyn CacheService>>,
    filter: FilterChoice,
    queue: Option<Arc<dyn BackgroundQueue>>,
}

impl OrchestratorBuilder {
    /// Share an existing profiler
    #[must_use]
    pub fn profiler(mut self, profiler: Arc<HookProfiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Use a custom cache service
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheService>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a custom hook filter
    #[must_use]
    pub fn filter(mut self, filter: Arc<dyn HookFilter>) -> Self {
        self.filter = FilterChoice::Custom(filter);
        self
    }

    /// Run every configured hook without consulting a filter
    #[must_use]
    pub fn no_filter(mut self) -> Self {
        self.filter = FilterChoice::Disabled;
        self
    }

    /// Use a custom background queue
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn BackgroundQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Load configuration and prepare every service
    ///
    /// Fails only for configuration problems. Unavailable auxiliary binaries
    /// are logged and leave their service disabled.
    #[tracing::instrument(skip_all, fields(config = %self.settings.config_path.display()))]
    pub fn build(self) -> Result<Orchestrator> {
        let mut settings = self.settings;
        let config = HooksConfig::load(&settings.config_path)?;

        settings.hooks_dir = std::path::absolute(&settings.hooks_dir)?;
        settings.working_dir = std::path::absolute(&settings.working_dir)?;

        let catalog = HookCatalog::resolve(
            &settings.hooks_dir,
            config.hook_groups.values().flat_map(|g| &g.hooks),
        );
        for group in config.hook_groups.values() {
            for hook_name in &group.hooks {
                if catalog.get(hook_name).is_some_and(|c| !c.exists()) {
                    tracing::warn!(
                        group = %group.name,
                        "Hook '{}' not found in {}",
                        hook_name,
                        settings.hooks_dir.display()
                    );
                }
            }
        }
        tracing::debug!(
            groups = config.hook_groups.len(),
            hooks = catalog.len(),
            "Loaded hook configuration"
        );

        let profiler = self.profiler.unwrap_or_else(|| {
            Arc::new(match &settings.metrics_file {
                Some(path) => HookProfiler::restore(settings.max_metrics, path.clone()),
                None => HookProfiler::new(settings.max_metrics),
            })
        });

        let cache = match self.cache {
            Some(cache) => cache,
            None => Arc::new(default_cache(&settings)),
        };

        let filter = match self.filter {
            FilterChoice::Custom(filter) => Some(filter),
            FilterChoice::Disabled => None,
            FilterChoice::Default => default_filter(&settings),
        };

        let queue = match self.queue {
            Some(queue) => queue,
            None => Arc::new(BackgroundQueueClient::new(
                settings.enqueue_script(),
                &settings.working_dir,
                settings.aux_timeout,
            )),
        };

        Ok(Orchestrator {
            settings,
            config,
            catalog,
            profiler,
            cache,
            filter,
            queue,
        })
    }
}

fn default_cache(settings: &OrchestratorSettings) -> CacheClient {
    let client = CacheClient::new(
        settings.cache_script(),
        &settings.working_dir,
        settings.aux_timeout,
    );

    if client.is_enabled() {
        let (binary, source) = settings.shared_cache();
        let shared_cache = AuxBinary::new("shared cache", binary, source);
        if let Err(e) = shared_cache.prepare(settings.build_missing) {
            tracing::warn!("Shared cache not prepared: {}", e);
        }
    } else {
        tracing::debug!("No cache endpoint at {}", settings.cache_script().display());
    }

    client
}

fn default_filter(settings: &OrchestratorSettings) -> Option<Arc<dyn HookFilter>> {
    let (binary, source) = settings.smart_filter();
    match AuxBinary::new("smart filter", binary, source).prepare(settings.build_missing) {
        Ok(binary) => Some(Arc::new(SmartFilterClient::new(
            binary,
            &settings.config_path,
            &settings.working_dir,
            settings.aux_timeout,
        ))),
        Err(e) => {
            tracing::warn!("{}; every configured hook will run", e);
            None
        }
    }
}

/// Runs the configured hook groups for tool events
pub struct Orchestrator {
    settings: OrchestratorSettings,
    config: HooksConfig,
    catalog: HookCatalog,
    profiler: Arc<HookProfiler>,
    cache: Arc<dyn CacheService>,
    filter: Option<Arc<dyn HookFilter>>,
    queue: Arc<dyn BackgroundQueue>,
}

impl Orchestrator {
    /// Start building an orchestrator from `settings`
    pub fn builder(settings: OrchestratorSettings) -> OrchestratorBuilder {
        OrchestratorBuilder {
            settings,
            profiler: None,
            cache: None,
            filter: FilterChoice::Default,
            queue: None,
        }
    }

    /// Loaded hooks document
    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    /// Resolved settings, with absolute directories
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Shared profiler
    pub fn profiler(&self) -> &Arc<HookProfiler> {
        &self.profiler
    }

    /// Whether a smart filter is in use
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Run the hooks relevant to `tool` and fail if any of them failed
    pub fn execute_hooks(
        &self,
        tool: &ToolContext,
        reporter: &dyn ResultReporter,
    ) -> Result<ExecutionReport> {
        self.run(tool, reporter).into_result()
    }

    /// Run the hooks relevant to `tool` and return everything that happened
    #[tracing::instrument(name = "invocation", skip_all, fields(tool = tool.tool_name().unwrap_or(UNKNOWN_TOOL)))]
    pub fn run(&self, tool: &ToolContext, reporter: &dyn ResultReporter) -> ExecutionReport {
        let started = Instant::now();
        reporter.invocation_started(&self.config.parallelization_config);

        self.warm_cache();

        let groups = self.select_groups(tool);
        if groups.is_empty() {
            reporter.nothing_to_run(tool.tool_name().unwrap_or(UNKNOWN_TOOL));
            return ExecutionReport {
                results: Vec::new(),
                stats: ExecutionStats::default(),
                elapsed: started.elapsed(),
                aborted: None,
            };
        }

        let observer = |result: &HookExecutionResult| reporter.hook_finished(result);
        let results = ResultLog::with_observer(&observer);
        let invoker = HookInvoker::new(
            &self.settings.working_dir,
            self.cache.endpoint(),
            tool,
            Arc::clone(&self.profiler),
        )
        .with_group_timeout(self.config.parallelization_config.timeout());
        let ctx = ExecutionContext {
            catalog: &self.catalog,
            invoker: &invoker,
            cache: self.cache.as_ref(),
            tool,
            results: &results,
            timeout: self.config.parallelization_config.timeout(),
        };

        let mut parallel_groups = 0;
        let mut sequential_groups = 0;
        let mut aborted = None;

        for group in &groups {
            let strategy = GroupStrategy::for_group(group);
            match group.mode {
                ExecutionMode::Parallel => parallel_groups += 1,
                ExecutionMode::Sequential => sequential_groups += 1,
            }
            reporter.group_started(group, strategy);

            match strategy {
                GroupStrategy::Background => {
                    BackgroundDispatcher::new(self.queue.as_ref()).dispatch(group, tool, &results);
                }
                GroupStrategy::Parallel => {
                    if let Err(e) = ParallelGroupExecutor::new(&ctx).run(group) {
                        tracing::warn!(group = %group.name, "{}", e);
                        for hook_name in &group.hooks {
                            results.push(HookExecutionResult::failed(
                                hook_name,
                                &group.name,
                                ABNORMAL_EXIT,
                                e.to_string(),
                                Duration::ZERO,
                            ));
                        }
                    }
                }
                GroupStrategy::Sequential => {
                    if let Err(e) = SequentialGroupExecutor::new(&ctx).run(group) {
                        tracing::warn!("{}", e);
                        aborted = Some(e);
                        break;
                    }
                }
            }
        }

        let results = results.into_results();
        let elapsed = started.elapsed();
        let stats =
            ExecutionStats::from_results(&results, parallel_groups, sequential_groups, elapsed);

        reporter.invocation_finished(&InvocationSummary {
            stats,
            elapsed,
            max_concurrent_groups: self.config.parallelization_config.max_concurrent_groups,
            slowest: self.profiler.get_top_slowest_hooks(SUMMARY_SLOWEST_HOOKS),
        });

        tracing::debug!(
            total = stats.total_hooks,
            failed = stats.failed_hooks,
            elapsed_ms = elapsed.as_millis(),
            "Invocation finished"
        );

        ExecutionReport {
            results,
            stats,
            elapsed,
            aborted,
        }
    }

    fn warm_cache(&self) {
        if !self.cache.is_enabled() {
            return;
        }
        if let Err(e) = self.cache.warm_git() {
            tracing::warn!("Git cache warmup failed: {}", e);
        }
        if let Err(e) = self.cache.warm_files(&self.settings.working_dir) {
            tracing::warn!("File cache warmup failed: {}", e);
        }
    }

    /// Groups to run for `tool`, filtered and in priority order
    fn select_groups(&self, tool: &ToolContext) -> Vec<HookGroupConfig> {
        let all = self.config.group_hooks();

        let selected = match &self.filter {
            Some(filter) => {
                let tool_name = tool.tool_name().unwrap_or(UNKNOWN_TOOL);
                match filter.filter(tool_name, &all, &tool.input_json()) {
                    Ok(filtered) => filtered,
                    Err(e) => {
                        tracing::warn!("Smart filter failed, running every hook: {}", e);
                        all
                    }
                }
            }
            None => all,
        };

        let mut groups = narrow_groups(&self.config, &selected);
        groups.sort_by_key(|g| g.priority);
        groups
    }
}

/// Apply a filter decision to the configured groups
///
/// Groups the configuration does not know are ignored, hooks not configured
/// for their group are dropped, and groups left empty disappear. Configured
/// hook order is kept.
fn narrow_groups(config: &HooksConfig, selected: &GroupHooks) -> Vec<HookGroupConfig> {
    config
        .hook_groups
        .values()
        .filter_map(|group| {
            let chosen = selected.get(&group.name)?;
            let hooks: Vec<String> = group
                .hooks
                .iter()
                .filter(|h| chosen.contains(h))
                .cloned()
                .collect();
            (!hooks.is_empty()).then(|| group.with_hooks(hooks))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::path::Path;

    const CONFIG: &str = r#"{
        "parallelization_config": {"max_concurrent_groups": 2, "timeout_seconds": 5},
        "hook_groups": {
            "lint":   {"parallel": true,  "hooks": ["a.sh", "b.sh", "c.sh"], "max_concurrent": 2, "priority": 2},
            "guard":  {"parallel": false, "hooks": ["g.sh"], "priority": 1},
            "notify": {"parallel": true,  "background_eligible": true, "hooks": ["log-n.sh"], "priority": 3}
        }
    }"#;

    fn config() -> HooksConfig {
        HooksConfig::parse(CONFIG, Path::new("test.json")).unwrap()
    }

    #[test]
    fn test_narrow_keeps_configured_order() {
        let mut selected = GroupHooks::new();
        selected.insert("lint".into(), vec!["c.sh".into(), "a.sh".into(), "zzz.sh".into()]);
        let groups = narrow_groups(&config(), &selected);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].hooks, vec!["a.sh", "c.sh"]);
        assert_eq!(groups[0].max_concurrent, 2);
    }

    #[test]
    fn test_narrow_drops_unknown_and_empty_groups() {
        let mut selected = GroupHooks::new();
        selected.insert("unknown".into(), vec!["a.sh".into()]);
        selected.insert("guard".into(), vec![]);
        selected.insert("notify".into(), vec!["log-n.sh".into()]);
        let groups = narrow_groups(&config(), &selected);
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["notify"]);
    }

    #[test]
    fn test_narrow_with_everything() {
        let config = config();
        let groups = narrow_groups(&config, &config.group_hooks());
        assert_eq!(groups.len(), 3);
    }

    fn report(failed: usize, aborted: Option<Error>) -> ExecutionReport {
        ExecutionReport {
            results: Vec::new(),
            stats: ExecutionStats {
                total_hooks: 4,
                successful_hooks: 4 - failed,
                failed_hooks: failed,
                ..ExecutionStats::default()
            },
            elapsed: Duration::ZERO,
            aborted,
        }
    }

    #[test]
    fn test_report_outcome() {
        assert!(report(0, None).into_result().is_ok());

        let err = report(2, None).into_result().unwrap_err();
        assert!(matches!(err, Error::HooksFailed { failed: 2, total: 4 }));

        let abort = Error::SequentialGroupFailed {
            group: "guard".into(),
            hook: "g.sh".into(),
        };
        let err = report(1, Some(abort)).into_result().unwrap_err();
        assert!(matches!(err, Error::SequentialGroupFailed { .. }));
    }

    #[test]
    fn test_build_fails_on_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let settings = OrchestratorSettings::new(dir.path().join("missing.json"), dir.path())
            .metrics_file(None);
        let err = Orchestrator::builder(settings).no_filter().build().err().unwrap();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
