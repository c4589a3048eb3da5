//! # Hookflow Engine
//!
//! Execution engine for hookflow.
//!
//! - **Profiler**: per-hook timing and outcome telemetry with a persisted snapshot
//! - **Services**: subprocess clients for the cache, smart filter and background queue
//! - **Hooks**: execution forms, tool context, invocation and group strategies
//! - **Orchestrator**: ties configuration, services and executors together

pub mod hooks;
pub mod orchestrator;
pub mod process;
pub mod profiler;
pub mod services;

// Re-export error types from core
pub use hookflow_core::{Error, Result};

// Re-export commonly used types
pub use hooks::{ExecutionStats, HookCommand, HookExecutionResult, ToolContext};
pub use orchestrator::{
    ExecutionReport, InvocationSummary, NoOpReporter, Orchestrator, OrchestratorBuilder,
    ResultReporter,
};
pub use profiler::{AggregatedMetrics, HookMetrics, HookProfiler, MetricStatus, ProfilerSummary};
