//! Runtime settings for one orchestrator invocation
//!
//! Everything that is not part of the hooks document: where things live on disk,
//! how long auxiliary processes may take, and how much telemetry to retain.

use crate::dirs::{self, hooks_path};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default capacity of the profiler ring buffer
pub const DEFAULT_MAX_METRICS: usize = 1000;

/// Default timeout for smart filter, cache and enqueue calls
pub const DEFAULT_AUX_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings resolved by the composition root before the orchestrator starts
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Path of the hooks configuration document
    pub config_path: PathBuf,
    /// Directory holding hook programs and auxiliary scripts
    pub hooks_dir: PathBuf,
    /// Working directory for hooks and root for file cache warmup
    pub working_dir: PathBuf,
    /// Profiler snapshot path; `None` keeps telemetry in memory only
    pub metrics_file: Option<PathBuf>,
    /// Profiler ring buffer capacity
    pub max_metrics: usize,
    /// Timeout for each auxiliary process call
    pub aux_timeout: Duration,
    /// Compile missing auxiliary binaries from source during initialization
    pub build_missing: bool,
}

impl OrchestratorSettings {
    /// Settings with defaults for everything but the two required paths
    pub fn new(config_path: impl Into<PathBuf>, hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            hooks_dir: hooks_dir.into(),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            metrics_file: dirs::default_metrics_file(),
            max_metrics: DEFAULT_MAX_METRICS,
            aux_timeout: DEFAULT_AUX_TIMEOUT,
            build_missing: true,
        }
    }

    /// Override the working directory
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Override the profiler snapshot path
    #[must_use]
    pub fn metrics_file(mut self, path: Option<PathBuf>) -> Self {
        self.metrics_file = path;
        self
    }

    /// Override the ring buffer capacity (clamped to at least 1)
    #[must_use]
    pub fn max_metrics(mut self, capacity: usize) -> Self {
        self.max_metrics = capacity.max(1);
        self
    }

    /// Override the auxiliary call timeout
    #[must_use]
    pub fn aux_timeout(mut self, timeout: Duration) -> Self {
        self.aux_timeout = timeout;
        self
    }

    /// Enable or disable building auxiliary binaries
    #[must_use]
    pub fn build_missing(mut self, enabled: bool) -> Self {
        self.build_missing = enabled;
        self
    }

    /// Absolute path of a hook program
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir.join(hook_name)
    }

    /// Cache endpoint script
    pub fn cache_script(&self) -> PathBuf {
        hooks_path(&self.hooks_dir, dirs::CACHE_SCRIPT)
    }

    /// Shared cache binary and its source
    pub fn shared_cache(&self) -> (PathBuf, PathBuf) {
        (
            hooks_path(&self.hooks_dir, dirs::SHARED_CACHE_BINARY),
            hooks_path(&self.hooks_dir, dirs::SHARED_CACHE_SOURCE),
        )
    }

    /// Smart filter binary and its source
    pub fn smart_filter(&self) -> (PathBuf, PathBuf) {
        (
            hooks_path(&self.hooks_dir, dirs::SMART_FILTER_BINARY),
            hooks_path(&self.hooks_dir, dirs::SMART_FILTER_SOURCE),
        )
    }

    /// Background enqueue program
    pub fn enqueue_script(&self) -> PathBuf {
        hooks_path(&self.hooks_dir, dirs::ENQUEUE_SCRIPT)
    }

    /// Hooks directory as a path reference
    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }
}
