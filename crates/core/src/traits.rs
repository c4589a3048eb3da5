//! Core behavioral traits for hookflow components
//!
//! The orchestrator talks to its three auxiliary processes (cache, smart filter,
//! background queue) through these interfaces. The engine crate provides the
//! subprocess-backed implementations; tests substitute recording doubles.

use crate::Result;
use indexmap::IndexMap;
use std::path::Path;

/// Mapping of group name to the hook identifiers it runs
pub type GroupHooks = IndexMap<String, Vec<String>>;

/// Shared cache service for git status and file metadata
///
/// Every operation is best-effort. Callers log failures and carry on.
pub trait CacheService: Send + Sync {
    /// Whether a cache endpoint is present at all
    fn is_enabled(&self) -> bool;

    /// Endpoint handed to hooks through `CACHE_INTEGRATION_SCRIPT`
    fn endpoint(&self) -> Option<&Path>;

    /// Pre-populate the git status cache
    fn warm_git(&self) -> Result<()>;

    /// Pre-populate file metadata under `root`
    fn warm_files(&self, root: &Path) -> Result<()>;

    /// Drop cached git status
    fn invalidate_git(&self) -> Result<()>;

    /// Drop cached metadata for one file
    fn invalidate_file(&self, path: &Path) -> Result<()>;
}

/// Decision component narrowing the group→hooks mapping for one invocation
///
/// # Examples
///
/// ```ignore
/// let relevant = filter.filter("Write", &groups, r#"{"file_path":"src/main.rs"}"#)?;
/// ```
pub trait HookFilter: Send + Sync {
    /// Return the relevant subset of `groups` for `tool_name`
    fn filter(&self, tool_name: &str, groups: &GroupHooks, tool_input_json: &str)
    -> Result<GroupHooks>;
}

/// Hand-off point for background-eligible hooks
pub trait BackgroundQueue: Send + Sync {
    /// Enqueue a hook for out-of-band execution
    ///
    /// Lower `priority` values are more urgent.
    fn enqueue(&self, hook_name: &str, tool_input_json: &str, priority: u8) -> Result<()>;
}

/// Cache service that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheService for NoCache {
    fn is_enabled(&self) -> bool {
        false
    }

    fn endpoint(&self) -> Option<&Path> {
        None
    }

    fn warm_git(&self) -> Result<()> {
        Ok(())
    }

    fn warm_files(&self, _root: &Path) -> Result<()> {
        Ok(())
    }

    fn invalidate_git(&self) -> Result<()> {
        Ok(())
    }

    fn invalidate_file(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Implement HookFilter for closures
impl<F> HookFilter for F
where
    F: Fn(&str, &GroupHooks, &str) -> Result<GroupHooks> + Send + Sync,
{
    fn filter(
        &self,
        tool_name: &str,
        groups: &GroupHooks,
        tool_input_json: &str,
    ) -> Result<GroupHooks> {
        self(tool_name, groups, tool_input_json)
    }
}
