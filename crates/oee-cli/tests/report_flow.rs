//! End-to-end integration tests for the signal engine flow.
//!
//! Tests the full pipeline: ingest → report / transitions, driving the
//! binary the way an operator would.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn oee_binary() -> String {
    env!("CARGO_BIN_EXE_oee").to_string()
}

/// One production hour on press-04: three units produced across one
/// unplanned stop (FAIL) and one planned stop (BREAK), with one unit
/// rejected at the end.
const SIGNAL_BATCH: &str = r#"[
    {"id": "s1", "entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:00:00Z"},
    {"id": "s2", "entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:10:00Z"},
    {"id": "s3", "entity_id": "press-04", "event": "FAIL", "timestamp": "2024-03-01T08:20:00Z"},
    {"id": "s4", "entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:30:00Z"},
    {"id": "s5", "entity_id": "press-04", "event": "BREAK", "timestamp": "2024-03-01T08:40:00Z"},
    {"id": "s6", "entity_id": "press-04", "event": "PRODUCTION", "timestamp": "2024-03-01T08:50:00Z"},
    {"id": "s7", "entity_id": "press-04", "event": "NOT_GOOD", "timestamp": "2024-03-01T08:55:00Z"}
]"#;

/// Writes a config file pointing at a database inside the temp dir, with a
/// one-minute ideal cycle.
fn write_config(temp: &Path) -> std::path::PathBuf {
    let db_path = temp.join("oee.db");
    let config_path = temp.join("config.toml");
    fs::write(
        &config_path,
        format!(
            "database_path = \"{}\"\nideal_cycle_ms = 60000\n",
            db_path.display()
        ),
    )
    .unwrap();
    config_path
}

fn ingest_batch(config_path: &Path, temp: &Path) {
    let batch_path = temp.join("signals.json");
    fs::write(&batch_path, SIGNAL_BATCH).unwrap();

    let output = Command::new(oee_binary())
        .arg("--config")
        .arg(config_path)
        .arg("ingest")
        .arg("--file")
        .arg(&batch_path)
        .output()
        .expect("failed to run oee ingest");
    assert!(
        output.status.success(),
        "ingest should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("7 signals saved"),
        "expected save confirmation: {stdout}"
    );
}

#[test]
fn test_ingest_then_report_derives_oee() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(temp.path());
    ingest_batch(&config_path, temp.path());

    let output = Command::new(oee_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("report")
        .arg("--entity")
        .arg("press-04")
        .arg("--start")
        .arg("2024-03-01T08:00:00Z")
        .arg("--end")
        .arg("2024-03-01T09:00:00Z")
        .arg("--json")
        .output()
        .expect("failed to run oee report");
    assert!(
        output.status.success(),
        "report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = &report["result"];
    let calc = &report["calculations"];

    // 3 units produced over 30 minutes of work, 10 minutes of unplanned and
    // 10 minutes of planned stoppage, 1 unit rejected.
    assert_eq!(result["total_production"].as_f64().unwrap(), 3.0);
    assert_eq!(result["not_good_production"].as_f64().unwrap(), 1.0);
    assert_eq!(
        result["total_work_duration"].as_i64().unwrap(),
        30 * 60 * 1_000_000_000_i64
    );
    assert_eq!(
        result["unplanned_stop_duration"].as_i64().unwrap(),
        10 * 60 * 1_000_000_000_i64
    );
    assert_eq!(
        result["planned_stop_duration"].as_i64().unwrap(),
        10 * 60 * 1_000_000_000_i64
    );

    // 50 planned minutes at a 1-minute cycle.
    assert_eq!(calc["planned_production"].as_i64().unwrap(), 50);
    assert_eq!(calc["good_production"].as_f64().unwrap(), 2.0);
    assert!((calc["availability"].as_f64().unwrap() - 0.8).abs() < 1e-9);
    assert!((calc["performance"].as_f64().unwrap() - 0.04).abs() < 1e-9);
    assert!((calc["quality"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-9);
    assert!((calc["oee"].as_f64().unwrap() - 0.8 * 0.04 * (2.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn test_reingesting_the_same_batch_saves_nothing() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(temp.path());
    ingest_batch(&config_path, temp.path());

    let output = Command::new(oee_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("ingest")
        .arg("--file")
        .arg(temp.path().join("signals.json"))
        .output()
        .expect("failed to run oee ingest");
    assert!(output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("0 signals saved"),
        "duplicates should be ignored"
    );
}

#[test]
fn test_transitions_reconstructs_state_timeline() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(temp.path());
    ingest_batch(&config_path, temp.path());

    let output = Command::new(oee_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("transitions")
        .arg("--entity")
        .arg("press-04")
        .arg("--json")
        .output()
        .expect("failed to run oee transitions");
    assert!(
        output.status.success(),
        "transitions should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let timeline: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let intervals = timeline.as_array().unwrap();
    assert_eq!(intervals.len(), 7);

    let states: Vec<&str> = intervals
        .iter()
        .map(|i| i["state"].as_str().unwrap())
        .collect();
    assert_eq!(
        states,
        [
            "PRODUCTION",
            "PRODUCTION",
            "FAIL",
            "PRODUCTION",
            "BREAK",
            "PRODUCTION",
            "NOT_GOOD"
        ]
    );

    // Only the final interval is still open.
    for interval in &intervals[..6] {
        assert_eq!(interval["open"], false);
    }
    assert_eq!(intervals[6]["open"], true);
    assert_eq!(
        intervals[0]["duration_ns"].as_i64().unwrap(),
        10 * 60 * 1_000_000_000_i64
    );
}

#[test]
fn test_report_for_unknown_entity_fails() {
    let temp = TempDir::new().unwrap();
    let config_path = write_config(temp.path());
    ingest_batch(&config_path, temp.path());

    let output = Command::new(oee_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("report")
        .arg("--entity")
        .arg("mill-01")
        .output()
        .expect("failed to run oee report");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no signals recorded"),
        "expected missing-entity error: {stderr}"
    );
}
