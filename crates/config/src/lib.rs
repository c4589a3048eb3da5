//! Configuration management for hookflow
//!
//! This crate handles:
//! - Loading and validating the hooks configuration document
//! - Runtime settings for one orchestrator invocation
//! - Well-known file locations
//! - Logging initialization

pub mod dirs;
pub mod hooks;
pub mod logging;
pub mod settings;

// Re-export error types from core
pub use hookflow_core::{Error, Result};

// Re-export main types
pub use dirs::default_metrics_file;
pub use hooks::{ExecutionMode, HookGroupConfig, HooksConfig, ParallelizationConfig};
pub use settings::{DEFAULT_AUX_TIMEOUT, DEFAULT_MAX_METRICS, OrchestratorSettings};
