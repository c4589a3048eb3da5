//! End-of-invocation summary

use hookflow_engine::{AggregatedMetrics, InvocationSummary, ProfilerSummary};
use owo_colors::OwoColorize;

/// One entry of the slowest-hooks list, `rank` starting at 1
pub fn format_slowest(rank: usize, hook: &AggregatedMetrics) -> String {
    format!(
        "{rank}. {}: {:.2}ms avg (runs: {})",
        hook.hook_name, hook.average_time_ms, hook.total_executions
    )
}

/// Label/value rows of the summary, in display order
pub fn summary_rows(summary: &InvocationSummary) -> Vec<(&'static str, String)> {
    let stats = &summary.stats;
    vec![
        ("Total hooks", stats.total_hooks.to_string()),
        ("Successful", stats.successful_hooks.to_string()),
        ("Failed", stats.failed_hooks.to_string()),
        ("Total time", format!("{}ms", stats.total_duration_ms)),
        ("Hook time", format!("{}ms", stats.hook_time_ms)),
        ("Parallel groups", stats.parallel_group_count.to_string()),
        ("Sequential groups", stats.sequential_group_count.to_string()),
        (
            "Average per hook",
            format!("{:.2}ms", stats.average_duration_ms()),
        ),
        (
            "Max concurrent groups",
            summary.max_concurrent_groups.to_string(),
        ),
    ]
}

/// Print the summary to stdout
pub fn print_summary(summary: &InvocationSummary) {
    println!();
    println!("{}", "Execution summary".bold());
    for (label, value) in summary_rows(summary) {
        let value = match label {
            "Failed" if summary.stats.failed_hooks > 0 => value.bright_red().bold().to_string(),
            "Successful" => value.bright_green().to_string(),
            _ => value,
        };
        println!("  {}: {}", label.dimmed(), value);
    }

    if summary.slowest.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        format!("Top {} slowest hooks", summary.slowest.len()).bold()
    );
    for (i, hook) in summary.slowest.iter().enumerate() {
        println!("  {}", format_slowest(i + 1, hook));
    }
}

/// Lines of the profiler overview, in display order
pub fn profiler_lines(summary: &ProfilerSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Tracked hooks: {}", summary.tracked_hooks),
        format!("Total executions: {}", summary.total_executions),
        format!("Retained samples: {}", summary.retained_samples),
    ];
    lines.extend(
        summary
            .slowest
            .iter()
            .enumerate()
            .map(|(i, hook)| format_slowest(i + 1, hook)),
    );
    lines
}

/// Print the profiler overview to stdout
pub fn print_profiler_summary(summary: &ProfilerSummary) {
    println!();
    println!("{}", "Performance profile".bold());
    for line in profiler_lines(summary) {
        println!("  {line}");
    }
}
