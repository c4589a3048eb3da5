//! Hook resolution and execution
//!
//! ## Execution Model
//!
//! - Groups run one after another in ascending priority
//! - Parallel groups fan out on a bounded worker pool under a group deadline
//! - Sequential groups run in list order and abort the invocation on the first failure
//! - Background-eligible groups are handed to the queue and never awaited
//!
//! ## Module Organization
//!
//! - `command`: execution form of each hook, resolved once per invocation
//! - `tool`: the triggering tool event and its projections
//! - `invocation`: launching one hook process with environment, stdin and deadline
//! - `executor`: group strategies and cache invalidation after side effects
//! - `result`: per-hook results, the shared result log, final statistics

pub mod command;
pub mod executor;
pub mod invocation;
pub mod result;
pub mod tool;

// Re-export main types for convenience
pub use command::{HookCatalog, HookCommand};
pub use executor::{
    BackgroundDispatcher, ExecutionContext, GroupStrategy, ParallelGroupExecutor,
    SequentialGroupExecutor, queue_priority,
};
pub use invocation::HookInvoker;
pub use result::{ExecutionStats, HookExecutionResult, ResultLog};
pub use tool::{ToolContext, UNKNOWN_TOOL};
