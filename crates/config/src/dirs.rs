//! Well-known locations
//!
//! The profiler snapshot lives under the user's home directory so that every
//! orchestrator invocation, whatever project it runs in, writes to one file.

use std::path::{Path, PathBuf};

/// Relative location of the profiler snapshot under `$HOME`
pub const METRICS_FILE: &str = ".claude/hooks/metrics/performance-metrics.json";

/// Cache endpoint script, relative to the hooks directory
pub const CACHE_SCRIPT: &str = "cache-integration.sh";
/// Shared cache binary, relative to the hooks directory
pub const SHARED_CACHE_BINARY: &str = "shared-cache";
/// Shared cache source, relative to the hooks directory
pub const SHARED_CACHE_SOURCE: &str = "cache/shared-cache.go";
/// Smart filter binary, relative to the hooks directory
pub const SMART_FILTER_BINARY: &str = "filter/smart-filter";
/// Smart filter source, relative to the hooks directory
pub const SMART_FILTER_SOURCE: &str = "filter/smart-filter.go";
/// Enqueue program, relative to the hooks directory
pub const ENQUEUE_SCRIPT: &str = "enqueue-hook.sh";

/// Get the default profiler snapshot path
///
/// Returns `~/.claude/hooks/metrics/performance-metrics.json`
#[must_use]
pub fn default_metrics_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(METRICS_FILE))
}

/// Resolve a well-known auxiliary path inside `hooks_dir`
#[must_use]
pub fn hooks_path(hooks_dir: &Path, relative: &str) -> PathBuf {
    hooks_dir.join(relative)
}
