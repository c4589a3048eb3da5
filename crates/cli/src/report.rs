//! Live console output while hooks run
//!
//! Logs go to stderr through `tracing`; everything here is user output on stdout.

use crate::stats;
use hookflow_config::{HookGroupConfig, ParallelizationConfig};
use hookflow_engine::hooks::GroupStrategy;
use hookflow_engine::{HookExecutionResult, InvocationSummary, ResultReporter};
use owo_colors::OwoColorize;

/// Hooks faster than this get a quick marker
pub const QUICK_THRESHOLD_MS: u64 = 100;

/// Bracketed status of a finished hook
pub fn status_label(result: &HookExecutionResult) -> String {
    if result.success {
        "SUCCESS".to_string()
    } else {
        format!("FAILED: {}", result.exit_code)
    }
}

/// Whether a finished hook counts as quick
pub fn is_quick(result: &HookExecutionResult) -> bool {
    result.duration_ms < QUICK_THRESHOLD_MS
}

/// Uncolored status line for a finished hook
pub fn status_line(result: &HookExecutionResult) -> String {
    let icon = if result.success { "✓" } else { "✗" };
    let quick = if is_quick(result) { " (quick)" } else { "" };
    format!(
        "{icon} {} ({}) - {}ms{quick} [{}]",
        result.hook_name,
        result.group_name,
        result.duration_ms,
        status_label(result)
    )
}

/// Heading printed when a group starts
pub fn group_heading(group: &HookGroupConfig, strategy: GroupStrategy) -> String {
    let action = match strategy {
        GroupStrategy::Background => "Enqueuing background group",
        GroupStrategy::Parallel => "Executing parallel group",
        GroupStrategy::Sequential => "Executing sequential group",
    };
    format!("{action}: {} ({} hooks)", group.name, group.hooks.len())
}

/// Prints progress to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ResultReporter for ConsoleReporter {
    fn invocation_started(&self, config: &ParallelizationConfig) {
        let timeout = match config.timeout() {
            Some(t) => format!("{}s timeout", t.as_secs()),
            None => "no timeout".to_string(),
        };
        println!("{}", "Hook orchestrator starting".bold());
        println!(
            "  {}",
            format!(
                "max {} concurrent groups, {timeout}",
                config.max_concurrent_groups
            )
            .dimmed()
        );
    }

    fn nothing_to_run(&self, tool_name: &str) {
        println!(
            "{} No relevant hooks to execute for {}",
            "✓".bright_green(),
            tool_name.cyan()
        );
    }

    fn group_started(&self, group: &HookGroupConfig, strategy: GroupStrategy) {
        println!("\n{}", group_heading(group, strategy).bold());
    }

    fn hook_finished(&self, result: &HookExecutionResult) {
        let line = status_line(result);
        if result.success {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
            if let Some(error) = &result.error_message {
                println!("    {}", error.dimmed());
            }
            for output in result.output.lines().filter(|l| !l.trim().is_empty()) {
                println!("    {}", output.dimmed());
            }
        }
    }

    fn invocation_finished(&self, summary: &InvocationSummary) {
        stats::print_summary(summary);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_line_success_quick() {
        let result = HookExecutionResult::succeeded("fmt.sh", "lint", "", Duration::from_millis(12));
        assert_eq!(
            status_line(&result),
            "✓ fmt.sh (lint) - 12ms (quick) [SUCCESS]"
        );
    }

    #[test]
    fn test_status_line_failure() {
        let result = HookExecutionResult::exited(
            "scan.py",
            "security",
            2,
            "found secrets".to_string(),
            Duration::from_millis(250),
        );
        assert!(!is_quick(&result));
        assert_eq!(
            status_line(&result),
            "✗ scan.py (security) - 250ms [FAILED: 2]"
        );
    }

    #[test]
    fn test_group_heading() {
        let config = hookflow_config::HooksConfig::parse(
            r#"{"hook_groups": {"lint": {"parallel": true, "hooks": ["a.sh", "b.sh"]}}}"#,
            std::path::Path::new("t.json"),
        )
        .unwrap();
        let group = &config.hook_groups["lint"];
        assert_eq!(
            group_heading(group, GroupStrategy::Parallel),
            "Executing parallel group: lint (2 hooks)"
        );
        assert_eq!(
            group_heading(group, GroupStrategy::Background),
            "Enqueuing background group: lint (2 hooks)"
        );
    }
}
