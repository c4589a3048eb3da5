//! Hook group configuration
//!
//! Declarative description of which hooks exist, how they are grouped, and how
//! each group is scheduled. The document is JSON and is loaded once per invocation.

use crate::{Error, Result};
use hookflow_core::GroupHooks;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How the hooks of one group are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Hooks fan out concurrently, bounded by `max_concurrent`
    Parallel,
    /// Hooks run one at a time and the first failure aborts the invocation
    Sequential,
}

impl ExecutionMode {
    /// Get the mode name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        }
    }

    /// Whether the mode is [`ExecutionMode::Parallel`]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The document stores the mode as `"parallel": bool`
mod parallel_flag {
    use super::ExecutionMode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mode: &ExecutionMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(mode.is_parallel())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ExecutionMode, D::Error> {
        Ok(if bool::deserialize(deserializer)? {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        })
    }
}

fn default_mode() -> ExecutionMode {
    ExecutionMode::Sequential
}

fn default_max_concurrent() -> usize {
    1
}

/// A named set of hooks sharing mode, priority and background eligibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookGroupConfig {
    /// Group name, taken from its key in `hook_groups`
    #[serde(skip)]
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Parallel or sequential scheduling
    #[serde(rename = "parallel", with = "parallel_flag", default = "default_mode")]
    pub mode: ExecutionMode,

    /// Hand hooks to the background queue instead of awaiting them
    #[serde(default)]
    pub background_eligible: bool,

    /// Hook identifiers, resolved relative to the hooks directory
    #[serde(default)]
    pub hooks: Vec<String>,

    /// Upper bound on concurrently running hooks (parallel groups only)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Lower runs first
    #[serde(default)]
    pub priority: i32,
}

impl HookGroupConfig {
    /// Copy of this group restricted to `hooks`
    #[must_use]
    pub fn with_hooks(&self, hooks: Vec<String>) -> Self {
        Self {
            hooks,
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(Error::HookConfig(format!(
                "group '{}': max_concurrent must be at least 1",
                self.name
            )));
        }

        if let Some(pos) = self.hooks.iter().position(|h| h.trim().is_empty()) {
            return Err(Error::HookConfig(format!(
                "group '{}': hook #{} has an empty name",
                self.name,
                pos + 1
            )));
        }

        Ok(())
    }
}

/// Invocation-wide scheduling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelizationConfig {
    /// Configuration schema version
    pub version: String,
    /// Human-readable description
    pub description: String,
    /// Advisory limit reported in the summary; groups themselves run one after another
    pub max_concurrent_groups: usize,
    /// Deadline for each parallel group and upper bound for each sequential hook (0 disables)
    pub timeout_seconds: u64,
}

impl Default for ParallelizationConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            description: String::new(),
            max_concurrent_groups: 1,
            timeout_seconds: 30,
        }
    }
}

impl ParallelizationConfig {
    /// Deadline duration, or `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// The full hooks configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Scheduling settings
    #[serde(default)]
    pub parallelization_config: ParallelizationConfig,

    /// Groups keyed by name, in declaration order
    pub hook_groups: IndexMap<String, HookGroupConfig>,

    /// Hook → hooks it depends on (consumed by the smart filter)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub hook_dependencies: IndexMap<String, Vec<String>>,

    /// File pattern → hooks it triggers (consumed by the smart filter)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub file_type_triggers: IndexMap<String, Vec<String>>,
}

impl HooksConfig {
    /// Load and validate the document at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON for this
    /// shape, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate a document; `origin` is used for error messages only
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(content).map_err(|source| Error::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;

        for (name, group) in &mut config.hook_groups {
            group.name.clone_from(name);
        }
        config.validate()?;

        tracing::debug!(
            groups = config.hook_groups.len(),
            hooks = config.total_hooks(),
            "Loaded hooks configuration from {}",
            origin.display()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for group in self.hook_groups.values() {
            group.validate()?;
        }

        for (hook, deps) in &self.hook_dependencies {
            for dep in deps.iter().chain(std::iter::once(hook)) {
                if !self.contains_hook(dep) {
                    tracing::warn!("hook_dependencies references unknown hook '{}'", dep);
                }
            }
        }

        Ok(())
    }

    /// Whether any group lists `hook`
    pub fn contains_hook(&self, hook: &str) -> bool {
        self.hook_groups
            .values()
            .any(|g| g.hooks.iter().any(|h| h == hook))
    }

    /// Total number of configured hook entries across all groups
    pub fn total_hooks(&self) -> usize {
        self.hook_groups.values().map(|g| g.hooks.len()).sum()
    }

    /// Group name → hook list, as handed to the smart filter
    pub fn group_hooks(&self) -> GroupHooks {
        self.hook_groups
            .iter()
            .map(|(name, group)| (name.clone(), group.hooks.clone()))
            .collect()
    }
}
