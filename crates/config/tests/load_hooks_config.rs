//! Integration tests for loading the hooks configuration from disk

use hookflow_config::{Error, ExecutionMode, HooksConfig};
use std::fs;

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parallel-groups.json");
    fs::write(
        &path,
        r#"{
            "parallelization_config": {"version": "1.0", "timeout_seconds": 5},
            "hook_groups": {
                "security": {"parallel": true, "hooks": ["secrets.sh", "deps.py"], "max_concurrent": 4, "priority": 1},
                "logging": {"parallel": false, "background_eligible": true, "hooks": ["log-event.sh"], "priority": 9}
            }
        }"#,
    )
    .unwrap();

    let config = HooksConfig::load(&path).unwrap();
    assert_eq!(config.hook_groups.len(), 2);
    assert_eq!(config.hook_groups["security"].mode, ExecutionMode::Parallel);
    assert!(config.hook_groups["logging"].background_eligible);
    assert_eq!(config.total_hooks(), 3);
}

#[test]
fn test_missing_file_is_config_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HooksConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::ConfigRead { .. }));
}

#[test]
fn test_wrong_field_type_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"hook_groups": {"g": {"parallel": "yes"}}}"#).unwrap();

    let err = HooksConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
    assert!(err.to_string().contains("bad.json"));
}
