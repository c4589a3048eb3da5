//! Hook execution profiler
//!
//! Thread-safe telemetry for hook runs. Samples go into a capped FIFO ring
//! buffer; each hook also has an [`AggregatedMetrics`] roll-up. After every
//! sample the full state is written to the snapshot file, if one is configured.
//!
//! ## Concurrency
//!
//! One `RwLock` guards the buffer, the roll-ups and the retained-window sums.
//! Queries take the read side. [`HookProfiler::record_metrics`] and
//! [`HookProfiler::clear_metrics`] hold the write side for append, roll-up
//! refresh and persistence together, so snapshot writes never interleave.
//!
//! ## Aggregation
//!
//! Roll-ups are maintained incrementally. Every hook keeps running sums over
//! its samples still in the buffer; evicting a sample subtracts it again. This
//! keeps `average_time_ms` and `cache_hit_rate` equal to a rescan of the
//! retained samples without touching the whole buffer on each insert.

mod metrics;
mod snapshot;

pub use metrics::{AggregatedMetrics, HookMetrics, MetricStatus};
pub use snapshot::ProfilerSnapshot;

use metrics::RetainedWindow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct ProfilerState {
    recent: VecDeque<HookMetrics>,
    aggregated: BTreeMap<String, AggregatedMetrics>,
    windows: HashMap<String, RetainedWindow>,
}

impl ProfilerState {
    fn push(&mut self, sample: HookMetrics, capacity: usize) {
        let window = self.windows.entry(sample.hook_name.clone()).or_default();
        window.add(&sample);
        let window = *window;

        let aggregated = self
            .aggregated
            .entry(sample.hook_name.clone())
            .or_insert_with(|| AggregatedMetrics::first(&sample));
        aggregated.absorb(&sample);
        aggregated.refresh(&window);

        self.recent.push_back(sample);

        while self.recent.len() > capacity {
            let Some(evicted) = self.recent.pop_front() else {
                break;
            };
            if let Some(window) = self.windows.get_mut(&evicted.hook_name) {
                window.remove(&evicted);
                if let Some(aggregated) = self.aggregated.get_mut(&evicted.hook_name) {
                    aggregated.refresh(window);
                }
            }
        }
    }

    fn rebuild_windows(&mut self) {
        self.windows.clear();
        for sample in &self.recent {
            self.windows
                .entry(sample.hook_name.clone())
                .or_default()
                .add(sample);
        }
        for (name, window) in &self.windows {
            if let Some(aggregated) = self.aggregated.get_mut(name) {
                aggregated.refresh(window);
            }
        }
    }
}

/// Process-wide hook telemetry
///
/// Constructed once by the composition root and shared behind an `Arc`.
#[derive(Debug)]
pub struct HookProfiler {
    state: RwLock<ProfilerState>,
    capacity: usize,
    snapshot_path: Option<PathBuf>,
}

impl HookProfiler {
    /// In-memory profiler with the given ring buffer capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(ProfilerState::default()),
            capacity: capacity.max(1),
            snapshot_path: None,
        }
    }

    /// Profiler that persists to `path` after every sample
    pub fn with_snapshot(capacity: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
            ..Self::new(capacity)
        }
    }

    /// Persisting profiler seeded from an existing snapshot at `path`
    ///
    /// A missing file starts empty. An unreadable one is logged and ignored.
    pub fn restore(capacity: usize, path: impl Into<PathBuf>) -> Self {
        let profiler = Self::with_snapshot(capacity, path);
        let Some(path) = profiler.snapshot_path.as_deref() else {
            return profiler;
        };
        if !path.exists() {
            return profiler;
        }

        match ProfilerSnapshot::read(path) {
            Ok(snapshot) => {
                let mut state = profiler.write();
                let skip = snapshot
                    .recent_metrics
                    .len()
                    .saturating_sub(profiler.capacity);
                state.recent = snapshot.recent_metrics.into_iter().skip(skip).collect();
                state.aggregated = snapshot.aggregated_metrics;
                state.rebuild_windows();
                tracing::debug!(
                    samples = state.recent.len(),
                    hooks = state.aggregated.len(),
                    "Restored profiler snapshot"
                );
            }
            Err(e) => tracing::warn!("Ignoring profiler snapshot: {}", e),
        }
        profiler
    }

    fn read(&self) -> RwLockReadGuard<'_, ProfilerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProfilerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ring buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot file, if persistence is enabled
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Start timing one execution of `hook_name`
    pub fn start_timer(&self, hook_name: impl Into<String>) -> Timer<'_> {
        Timer {
            profiler: self,
            hook_name: hook_name.into(),
            started_at: Instant::now(),
            files_processed: 0,
            cache_hits: 0,
            cache_misses: 0,
            custom_metrics: serde_json::Map::new(),
        }
    }

    /// Record one sample
    ///
    /// Appends to the ring buffer (evicting the oldest entries beyond capacity),
    /// refreshes the roll-up and rewrites the snapshot. Persistence failures are
    /// logged and otherwise ignored.
    pub fn record_metrics(&self, sample: HookMetrics) {
        let mut state = self.write();
        state.push(sample, self.capacity);
        self.persist(&state);
    }

    /// Drop every sample and roll-up, then persist the empty snapshot
    pub fn clear_metrics(&self) {
        let mut state = self.write();
        *state = ProfilerState::default();
        self.persist(&state);
    }

    fn persist(&self, state: &ProfilerState) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Err(e) = snapshot::write(path, &state.aggregated, &state.recent) {
            tracing::warn!("Failed to persist profiler snapshot: {}", e);
        }
    }

    /// Copy of every roll-up
    pub fn get_aggregated_metrics(&self) -> BTreeMap<String, AggregatedMetrics> {
        self.read().aggregated.clone()
    }

    /// Roll-up for one hook
    pub fn aggregated(&self, hook_name: &str) -> Option<AggregatedMetrics> {
        self.read().aggregated.get(hook_name).cloned()
    }

    /// Up to `limit` retained samples for `hook_name`, most recent first
    pub fn get_metrics(&self, hook_name: &str, limit: usize) -> Vec<HookMetrics> {
        self.read()
            .recent
            .iter()
            .rev()
            .filter(|m| m.hook_name == hook_name)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of retained samples
    pub fn recent_len(&self) -> usize {
        self.read().recent.len()
    }

    /// The `n` hooks with the highest average time
    pub fn get_top_slowest_hooks(&self, n: usize) -> Vec<AggregatedMetrics> {
        let mut all: Vec<_> = self.read().aggregated.values().cloned().collect();
        all.sort_by(|a, b| b.average_time_ms.total_cmp(&a.average_time_ms));
        all.truncate(n);
        all
    }

    /// Overall telemetry with the five slowest hooks
    pub fn summary(&self) -> ProfilerSummary {
        let state = self.read();
        let mut slowest: Vec<_> = state.aggregated.values().cloned().collect();
        slowest.sort_by(|a, b| b.average_time_ms.total_cmp(&a.average_time_ms));
        slowest.truncate(SUMMARY_SLOWEST);

        ProfilerSummary {
            tracked_hooks: state.aggregated.len(),
            total_executions: state.aggregated.values().map(|a| a.total_executions).sum(),
            retained_samples: state.recent.len(),
            slowest,
        }
    }

    /// Owned copy of the current state in snapshot form
    pub fn snapshot(&self) -> ProfilerSnapshot {
        let state = self.read();
        ProfilerSnapshot {
            aggregated_metrics: state.aggregated.clone(),
            recent_metrics: state.recent.iter().cloned().collect(),
            generated_at: chrono::Utc::now(),
        }
    }
}

/// Number of hooks listed in [`ProfilerSummary::slowest`]
pub const SUMMARY_SLOWEST: usize = 5;

/// Overview returned by [`HookProfiler::summary`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilerSummary {
    /// Hooks with a roll-up
    pub tracked_hooks: usize,
    /// Executions across all hooks
    pub total_executions: u64,
    /// Samples still in the ring buffer
    pub retained_samples: usize,
    /// Highest average time first
    pub slowest: Vec<AggregatedMetrics>,
}

/// In-flight measurement for one hook execution
///
/// Annotations accumulate on the timer; [`Timer::stop`] turns it into a
/// [`HookMetrics`] sample and records it.
#[derive(Debug)]
pub struct Timer<'p> {
    profiler: &'p HookProfiler,
    hook_name: String,
    started_at: Instant,
    files_processed: u64,
    cache_hits: u64,
    cache_misses: u64,
    custom_metrics: serde_json::Map<String, serde_json::Value>,
}

impl Timer<'_> {
    /// Number of files the hook processed
    pub fn set_files_processed(&mut self, count: u64) {
        self.files_processed = count;
    }

    /// Cache statistics reported by the hook
    pub fn set_cache_stats(&mut self, hits: u64, misses: u64) {
        self.cache_hits = hits;
        self.cache_misses = misses;
    }

    /// Attach a free-form annotation
    pub fn set_custom_metric(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.custom_metrics.insert(key.into(), value.into());
    }

    /// Finish the measurement and record it
    pub fn stop(self, status: MetricStatus, error_details: Option<String>) -> Duration {
        let elapsed = self.started_at.elapsed();
        self.profiler.record_metrics(HookMetrics {
            hook_name: self.hook_name,
            execution_time_ms: elapsed.as_secs_f64() * 1000.0,
            memory_usage_bytes: resident_memory_bytes(),
            files_processed: self.files_processed,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            timestamp: chrono::Utc::now(),
            status,
            error_details,
            custom_metrics: self.custom_metrics,
        });
        elapsed
    }
}

/// Resident set size of this process
#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> u64 {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find_map(|line| line.strip_prefix("VmRSS:"))
                .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        })
        .map_or(0, |kb| kb * 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> u64 {
    0
}
