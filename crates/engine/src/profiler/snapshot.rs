//! Persisted profiler state
//!
//! The snapshot is rewritten in full after every recorded sample. Writes go to a
//! temporary file in the same directory and are renamed into place, so readers
//! never observe a partially written document.

use super::metrics::{AggregatedMetrics, HookMetrics};
use chrono::{DateTime, Utc};
use hookflow_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Full profiler state as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilerSnapshot {
    /// Roll-ups keyed by hook name
    pub aggregated_metrics: BTreeMap<String, AggregatedMetrics>,
    /// Retained samples, oldest first
    pub recent_metrics: Vec<HookMetrics>,
    /// When the snapshot was produced
    pub generated_at: DateTime<Utc>,
}

/// Borrowed view serialized while the profiler write lock is held
#[derive(Serialize)]
struct SnapshotView<'a> {
    aggregated_metrics: &'a BTreeMap<String, AggregatedMetrics>,
    recent_metrics: &'a VecDeque<HookMetrics>,
    generated_at: DateTime<Utc>,
}

impl ProfilerSnapshot {
    /// Read a snapshot from `path`
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|e| {
            Error::Persistence(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_slice(&content).map_err(|e| {
            Error::Persistence(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}

pub(crate) fn write(
    path: &Path,
    aggregated_metrics: &BTreeMap<String, AggregatedMetrics>,
    recent_metrics: &VecDeque<HookMetrics>,
) -> Result<()> {
    let view = SnapshotView {
        aggregated_metrics,
        recent_metrics,
        generated_at: Utc::now(),
    };
    let json = serde_json::to_vec_pretty(&view)
        .map_err(|e| Error::Persistence(format!("Failed to serialize snapshot: {e}")))?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| {
        Error::Persistence(format!("Failed to create {}: {e}", dir.display()))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::Persistence(format!("Failed to create temp file: {e}")))?;
    temp.write_all(&json)
        .map_err(|e| Error::Persistence(format!("Failed to write snapshot: {e}")))?;
    temp.persist(path).map_err(|e| {
        Error::Persistence(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    Ok(())
}
