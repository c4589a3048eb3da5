//! Telemetry records
//!
//! [`HookMetrics`] is one execution sample; [`AggregatedMetrics`] is the per-hook
//! roll-up kept alongside the ring buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    /// Hook completed normally
    Success,
    /// Hook failed
    Error,
    /// Hook completed but reported a problem
    Warning,
}

impl MetricStatus {
    /// Get the status name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    /// Whether the run counts as successful in aggregates
    ///
    /// Only `Success` does; warnings are tallied with the failed runs.
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One execution sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookMetrics {
    /// Hook identifier
    pub hook_name: String,
    /// Wall time in milliseconds
    pub execution_time_ms: f64,
    /// Resident memory of the orchestrator when the sample was taken
    pub memory_usage_bytes: u64,
    /// Files the hook reported touching
    pub files_processed: u64,
    /// Cache hits reported by the hook
    pub cache_hits: u64,
    /// Cache misses reported by the hook
    pub cache_misses: u64,
    /// When the sample was recorded
    pub timestamp: DateTime<Utc>,
    /// Outcome
    pub status: MetricStatus,
    /// Failure detail, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Free-form annotations
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom_metrics: serde_json::Map<String, serde_json::Value>,
}

impl HookMetrics {
    /// Sample with only a name, time and status set
    pub fn new(hook_name: impl Into<String>, execution_time_ms: f64, status: MetricStatus) -> Self {
        Self {
            hook_name: hook_name.into(),
            execution_time_ms,
            memory_usage_bytes: 0,
            files_processed: 0,
            cache_hits: 0,
            cache_misses: 0,
            timestamp: Utc::now(),
            status,
            error_details: None,
            custom_metrics: serde_json::Map::new(),
        }
    }
}

/// Per-hook roll-up
///
/// Counters, min/max and `last_executed` cover every recorded sample.
/// `average_time_ms` and `cache_hit_rate` cover the samples still retained in
/// the ring buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Hook identifier
    pub hook_name: String,
    /// Samples recorded
    pub total_executions: u64,
    /// Samples with a non-error status
    pub successful_runs: u64,
    /// Samples with an error status
    pub failed_runs: u64,
    /// Mean wall time over retained samples
    pub average_time_ms: f64,
    /// Fastest sample
    pub min_time_ms: f64,
    /// Slowest sample
    pub max_time_ms: f64,
    /// Sum of `files_processed`
    pub total_files_processed: u64,
    /// hits / (hits + misses) over retained samples; `None` without cache traffic
    pub cache_hit_rate: Option<f64>,
    /// Timestamp of the latest sample
    pub last_executed: DateTime<Utc>,
}

impl AggregatedMetrics {
    pub(crate) fn first(sample: &HookMetrics) -> Self {
        Self {
            hook_name: sample.hook_name.clone(),
            total_executions: 0,
            successful_runs: 0,
            failed_runs: 0,
            average_time_ms: 0.0,
            min_time_ms: sample.execution_time_ms,
            max_time_ms: sample.execution_time_ms,
            total_files_processed: 0,
            cache_hit_rate: None,
            last_executed: sample.timestamp,
        }
    }

    pub(crate) fn absorb(&mut self, sample: &HookMetrics) {
        self.total_executions += 1;
        if sample.status.is_successful() {
            self.successful_runs += 1;
        } else {
            self.failed_runs += 1;
        }
        self.min_time_ms = self.min_time_ms.min(sample.execution_time_ms);
        self.max_time_ms = self.max_time_ms.max(sample.execution_time_ms);
        self.total_files_processed += sample.files_processed;
        self.last_executed = self.last_executed.max(sample.timestamp);
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn refresh(&mut self, window: &RetainedWindow) {
        if window.samples == 0 {
            return;
        }
        self.average_time_ms = window.time_sum_ms / window.samples as f64;
        self.cache_hit_rate = (window.cache_lookups > 0)
            .then(|| window.cache_hits as f64 / window.cache_lookups as f64);
    }
}

/// Running sums over the samples of one hook that are still in the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RetainedWindow {
    pub samples: u64,
    pub time_sum_ms: f64,
    pub cache_hits: u64,
    pub cache_lookups: u64,
}

impl RetainedWindow {
    pub fn add(&mut self, sample: &HookMetrics) {
        self.samples += 1;
        self.time_sum_ms += sample.execution_time_ms;
        self.cache_hits += sample.cache_hits;
        self.cache_lookups += sample.cache_hits + sample.cache_misses;
    }

    pub fn remove(&mut self, sample: &HookMetrics) {
        self.samples = self.samples.saturating_sub(1);
        self.cache_hits = self.cache_hits.saturating_sub(sample.cache_hits);
        self.cache_lookups = self
            .cache_lookups
            .saturating_sub(sample.cache_hits + sample.cache_misses);
        // Float drift would leave a tiny remainder once the window empties
        self.time_sum_ms = if self.samples == 0 {
            0.0
        } else {
            (self.time_sum_ms - sample.execution_time_ms).max(0.0)
        };
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MetricStatus::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_metrics_omit_empty_optionals() {
        let sample = HookMetrics::new("lint", 12.5, MetricStatus::Success);
        let value = serde_json::to_value(&sample).unwrap();
        assert!(value.get("error_details").is_none());
        assert!(value.get("custom_metrics").is_none());
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn test_window_remove_to_empty_resets_sum() {
        let a = HookMetrics::new("x", 0.1, MetricStatus::Success);
        let b = HookMetrics::new("x", 0.2, MetricStatus::Success);
        let mut window = RetainedWindow::default();
        window.add(&a);
        window.add(&b);
        window.remove(&a);
        window.remove(&b);
        assert_eq!(window, RetainedWindow::default());
    }

    #[test]
    fn test_refresh_without_cache_traffic_leaves_rate_undefined() {
        let sample = HookMetrics::new("x", 4.0, MetricStatus::Success);
        let mut window = RetainedWindow::default();
        window.add(&sample);
        let mut agg = AggregatedMetrics::first(&sample);
        agg.absorb(&sample);
        agg.refresh(&window);
        assert!(agg.cache_hit_rate.is_none());
        assert!((agg.average_time_ms - 4.0).abs() < f64::EPSILON);
    }
}
