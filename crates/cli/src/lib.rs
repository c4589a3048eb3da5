//! Hookflow CLI library
//!
//! Argument parsing and console reporting for the `orchestrator` binary, kept
//! in a library so it can be tested without spawning the process.

pub mod error;
pub mod report;
pub mod stats;

use anyhow::{Context, Result};
use clap::Parser;
use hookflow_config::{DEFAULT_MAX_METRICS, OrchestratorSettings};
use hookflow_engine::{Orchestrator, ToolContext};
use std::path::PathBuf;
use std::time::Duration;

use error::CommandError;
use report::ConsoleReporter;

/// Run the configured hooks for one tool event
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(about = "Run configured hook groups for a tool event")]
#[command(version)]
#[command(long_about = "Run configured hook groups for a tool event

Loads the hook group document, asks the smart filter which hooks are relevant,
then runs each group by ascending priority: parallel groups fan out up to their
max_concurrent, sequential groups stop at the first failure, and background
groups are handed to the queue.

Exits non-zero when any hook failed.")]
pub struct Cli {
    /// Hook group configuration document
    #[arg(env = "HOOKFLOW_CONFIG", value_name = "CONFIG")]
    pub config_path: PathBuf,

    /// Directory holding the hooks and auxiliary programs
    #[arg(env = "HOOKFLOW_HOOKS_DIR", value_name = "HOOKS_DIR")]
    pub hooks_dir: PathBuf,

    /// Tool matcher that triggered the hooks (e.g. Write, Bash)
    #[arg(value_name = "MATCHER")]
    pub matcher: Option<String>,

    /// Tool input as a JSON object
    #[arg(value_name = "TOOL_INPUT")]
    pub tool_input: Option<String>,

    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "HOOKFLOW_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Working directory for hooks (defaults to the current directory)
    #[arg(long, env = "HOOKFLOW_WORKING_DIR", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Profiler snapshot file
    #[arg(long, env = "HOOKFLOW_METRICS_FILE", value_name = "FILE")]
    pub metrics_file: Option<PathBuf>,

    /// Keep profiler metrics in memory only
    #[arg(long, env = "HOOKFLOW_NO_METRICS", conflicts_with = "metrics_file")]
    pub no_metrics: bool,

    /// Number of recent metric samples to retain
    #[arg(long, env = "HOOKFLOW_MAX_METRICS", value_name = "N", default_value_t = DEFAULT_MAX_METRICS)]
    pub max_metrics: usize,

    /// Timeout in seconds for smart filter, cache and queue calls
    #[arg(long, env = "HOOKFLOW_AUX_TIMEOUT", value_name = "SECS", default_value_t = 10)]
    pub aux_timeout: u64,

    /// Do not build missing auxiliary binaries from source
    #[arg(long, env = "HOOKFLOW_NO_BUILD")]
    pub no_build: bool,
}

impl Cli {
    /// Runtime settings described by these arguments
    pub fn settings(&self) -> OrchestratorSettings {
        let mut settings = OrchestratorSettings::new(self.config_path.clone(), self.hooks_dir.clone())
            .max_metrics(self.max_metrics)
            .aux_timeout(Duration::from_secs(self.aux_timeout))
            .build_missing(!self.no_build);

        if let Some(dir) = &self.working_dir {
            settings = settings.working_dir(dir.clone());
        }
        if self.no_metrics {
            settings = settings.metrics_file(None);
        } else if let Some(path) = &self.metrics_file {
            settings = settings.metrics_file(Some(path.clone()));
        }
        settings
    }

    /// Triggering tool event described by these arguments
    pub fn tool_context(&self) -> std::result::Result<ToolContext, CommandError> {
        ToolContext::from_args(self.matcher.as_deref(), self.tool_input.as_deref())
            .map_err(CommandError::from)
    }
}

/// Main entry point for the CLI application
pub fn run(cli: Cli) -> Result<()> {
    hookflow_config::logging::init(cli.verbose, cli.log_file.as_deref())
        .context("Failed to initialize logging")?;

    if !cli.hooks_dir.is_dir() {
        return Err(CommandError::Usage(format!(
            "hooks directory {} does not exist",
            cli.hooks_dir.display()
        ))
        .into());
    }

    let tool = cli.tool_context()?;
    tracing::debug!(
        matcher = cli.matcher.as_deref().unwrap_or_default(),
        tool = tool.tool_name().unwrap_or_default(),
        "Parsed tool event"
    );

    let orchestrator = Orchestrator::builder(cli.settings())
        .build()
        .with_context(|| {
            format!(
                "Failed to initialize orchestrator from {}",
                cli.config_path.display()
            )
        })?;

    let outcome = orchestrator.execute_hooks(&tool, &ConsoleReporter);
    if cli.verbose {
        stats::print_profiler_summary(&orchestrator.profiler().summary());
    }
    outcome.map_err(CommandError::from)?;

    Ok(())
}
