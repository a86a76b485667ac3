//! CLI end-to-end tests for giftscore.
//!
//! These run the real binary against record files in a temp directory and
//! check payloads on stdout, structured errors on stderr, and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the giftscore binary, isolated from user config.
fn giftscore(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("giftscore").expect("giftscore binary should exist");
    cmd.env("XDG_CONFIG_HOME", home)
        .env_remove("GIFTSCORE_CONFIG")
        .env_remove("GIFTSCORE_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env_remove("GS_LOG");
    cmd
}

/// Small gifts appended so the gift-count columns vary independently.
fn extras(i: usize) -> &'static [u64] {
    match i % 3 {
        0 => &[1],
        1 => &[7],
        _ => &[150],
    }
}

/// Two days of records: 3.2x below 50k coins, 2.7x + 15000 above.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (day, offset) in [("20250101", 0u64), ("20250102", 1_000)] {
        let day_dir = dir.path().join("data").join(day);
        std::fs::create_dir_all(&day_dir).unwrap();

        let mut records = Vec::new();
        for (i, base) in (2_000 + offset..48_000).step_by(4_000).enumerate() {
            let mut gifts = vec![base / 2, base - base / 2];
            gifts.extend_from_slice(extras(i));
            let total: u64 = gifts.iter().sum();
            records.push(json!({
                "gift": gifts,
                "livescore": (3.2 * total as f64) as u64,
                "rank": if i % 2 == 0 { "A2" } else { "B1" },
            }));
        }
        for (i, base) in (50_000 + offset..200_000).step_by(10_000).enumerate() {
            let mut gifts = vec![base];
            gifts.extend_from_slice(extras(i + 1));
            let total: u64 = gifts.iter().sum();
            let wobble = if i % 2 == 0 { 800.0 } else { -800.0 };
            records.push(json!({
                "gift": gifts,
                "livescore": (2.7 * total as f64 + 15_000.0 + wobble) as u64,
                "label": format!("{}-{}", day, i),
            }));
        }
        std::fs::write(
            day_dir.join("records.json"),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();
    }
    dir
}

/// One stream well above every band boundary and one below all of them.
fn two_band_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let day_dir = dir.path().join("data").join("20250101");
    std::fs::create_dir_all(&day_dir).unwrap();
    let records = json!([
        { "gift": [10_000], "livescore": 32_000, "label": "top" },
        { "gift": [10_000], "livescore": 15_000, "label": "low" },
    ]);
    std::fs::write(day_dir.join("records.json"), records.to_string()).unwrap();
    dir
}

fn data(dir: &TempDir) -> String {
    dir.path().join("data").display().to_string()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should be JSON")
}

// ============================================================================
// model / check
// ============================================================================

mod model {
    use super::*;

    #[test]
    fn default_preset_evaluates_envelope() {
        let home = tempfile::tempdir().unwrap();
        let out = giftscore(home.path())
            .args(["model", "--eval", "100000", "--eval", "0"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        assert_eq!(doc["model"], "ru-v2");
        let score = doc["evaluations"][0]["score"].as_f64().unwrap();
        assert!((score - (2.675_280_793 * 100_000.0 + 17_299.150_66)).abs() < 1e-6);
        assert_eq!(doc["evaluations"][1]["score"].as_f64(), Some(0.0));
        let bx = doc["breakpoints"][0]["x"].as_f64().unwrap();
        assert!((bx - 53_274.18).abs() < 0.01);
    }

    #[test]
    fn linear_preset_has_no_breakpoints() {
        let home = tempfile::tempdir().unwrap();
        let out = giftscore(home.path())
            .args(["--preset", "linear-3x", "model"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        assert_eq!(doc["breakpoints"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn sample_curve_in_jsonl() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .args(["model", "--sample", "0", "100000", "--count", "11", "-f", "jsonl"])
            .assert()
            .success()
            .stdout(predicate::function(|s: &str| s.lines().count() == 11));
    }

    #[test]
    fn reversed_sample_range_is_args_error() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .args(["model", "--sample", "10", "1"])
            .assert()
            .code(10);
        giftscore(home.path())
            .args(["model", "--sample", "NaN", "1"])
            .assert()
            .code(10);
    }

    #[test]
    fn jsonl_logs_go_to_stderr() {
        let home = tempfile::tempdir().unwrap();
        let out = giftscore(home.path())
            .args(["-v", "--log-format", "jsonl", "model", "--eval", "1000"])
            .assert()
            .success()
            .get_output()
            .clone();
        stdout_json(&out.stdout);
        let stderr = String::from_utf8(out.stderr).unwrap();
        assert!(stderr.contains("run.started"), "{stderr}");
        for line in stderr.lines() {
            serde_json::from_str::<Value>(line).expect("each log line should be JSON");
        }
    }

    #[test]
    fn unknown_preset_is_config_error() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .args(["--preset", "v9", "model"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains(r#""category":"config""#));
    }

    #[test]
    fn check_defaults() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""status": "ok""#))
            .stdout(predicate::str::contains(r#""using_defaults": true"#));
    }

    #[test]
    fn check_rejects_bad_boundaries() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("gs.toml");
        std::fs::write(&path, "[fit]\nboundaries = [0, 50000, 20000]\n").unwrap();
        giftscore(home.path())
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .code(12);
    }
}

// ============================================================================
// extract / fit / classify
// ============================================================================

mod analysis {
    use super::*;

    #[test]
    fn extract_filters_and_orders() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        let out = giftscore(home.path())
            .args(["extract", &data(&dir), "--cond", "total_gift>=100000"])
            .args(["--order", "-livescore", "--key", "livescore", "--key", "date"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        let rows = doc["records"].as_array().unwrap();
        assert!(!rows.is_empty());
        let scores: Vec<u64> = rows.iter().map(|r| r["livescore"].as_u64().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert!(rows.iter().all(|r| r["date"].as_str().is_some()));
    }

    #[test]
    fn extract_slice_by_date_and_rank() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["extract", &data(&dir), "--slice", "20250101/A2", "-f", "jsonl"])
            .assert()
            .success()
            .stdout(predicate::function(|s: &str| {
                s.lines().count() > 0 && s.lines().all(|l| l.contains(r#""rank":"A2""#))
            }));
    }

    #[test]
    fn extract_summary_is_comma_separated() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["extract", &data(&dir), "-f", "summary", "--key", "date", "--key", "rate"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("date,rate\n2025010"));
    }

    #[test]
    fn bad_condition_is_condition_error() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["extract", &data(&dir), "--cond", "rank=>5"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("rank=>5"));
    }

    #[test]
    fn bad_slice_is_condition_error() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["classify", &data(&dir), "--slice", "yesterday?"])
            .assert()
            .code(11);
    }

    #[test]
    fn fit_reports_two_segments() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        let out = giftscore(home.path())
            .args(["fit", &data(&dir), "--features"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        let segments = doc["fit"]["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0]["slope"].as_f64(), Some(3.0));
        let slope = segments[1]["slope"].as_f64().unwrap();
        assert!((slope - 2.7).abs() < 0.05, "{slope}");
        assert_eq!(doc["features"].as_array().map(Vec::len), Some(4));
        assert!(doc["config"]["config_hash"].as_str().is_some());
    }

    #[test]
    fn fit_without_override_keeps_fitted_slope() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        let out = giftscore(home.path())
            .args(["fit", &data(&dir), "--no-slope-override"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        let slope = doc["fit"]["segments"][0]["slope"].as_f64().unwrap();
        assert!((slope - 3.2).abs() < 0.01, "{slope}");
    }

    #[test]
    fn empty_range_is_fit_error() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["fit", &data(&dir), "--boundary", "0", "--boundary", "1000000"])
            .assert()
            .code(14)
            .stderr(predicate::str::contains("empty partition"));
    }

    #[test]
    fn snapshot_reflects_fit_overrides() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        let run = |extra: &[&str]| {
            let out = giftscore(home.path())
                .args(["fit", &data(&dir)])
                .args(extra)
                .assert()
                .success()
                .get_output()
                .stdout
                .clone();
            stdout_json(&out)
        };
        let narrow = run(&["--boundary", "0", "--boundary", "20000"]);
        let wide = run(&["--boundary", "0", "--boundary", "40000"]);
        let plain = run(&[]);
        let no_exclude = run(&["--no-exclude"]);

        assert_eq!(narrow["config"]["boundaries"], json!([0.0, 20000.0]));
        assert_eq!(narrow["fit"]["segments"][1]["lo"], json!(20000.0));
        let hash = |doc: &Value| doc["config"]["config_hash"].as_str().unwrap().to_string();
        assert_ne!(hash(&narrow), hash(&wide));
        assert_ne!(hash(&plain), hash(&no_exclude));
        assert_eq!(hash(&plain), hash(&run(&[])));
    }

    #[test]
    fn invalid_boundary_override_is_args_error() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["fit", &data(&dir), "--boundary", "0", "--boundary", "0"])
            .assert()
            .code(10);
    }

    #[test]
    fn conditions_can_test_class() {
        let home = tempfile::tempdir().unwrap();
        let dir = two_band_fixture();
        let out = giftscore(home.path())
            .args(["extract", &data(&dir), "--cond", "class=0"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        assert_eq!(doc["count"], 1);
        assert_eq!(doc["records"][0]["livescore"], 32_000);

        let out = giftscore(home.path())
            .args(["classify", &data(&dir), "--cond", "class=3"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        assert_eq!(doc["counts"]["C"], 1);
        assert_eq!(doc["counts"]["Z"], 0);
    }

    #[test]
    fn conflicting_slope_flags_are_args_error() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["fit", &data(&dir), "--first-slope", "3", "--no-slope-override"])
            .assert()
            .code(10);
    }

    #[test]
    fn classify_table_summary() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        giftscore(home.path())
            .args(["classify", &data(&dir), "--table", "--coin", "1000", "-f", "summary"])
            .arg("--max-gifters")
            .arg("2")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("gifters,coin,total,Z,A,B,C\n1,1000,"));
    }

    #[test]
    fn classify_counts_every_record() {
        let home = tempfile::tempdir().unwrap();
        let dir = fixture();
        let out = giftscore(home.path())
            .args(["classify", &data(&dir)])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc = stdout_json(&out);
        let records = doc["records"].as_array().unwrap().len() as u64;
        let counted: u64 = ["Z", "A", "B", "C"]
            .iter()
            .map(|b| doc["counts"][b].as_u64().unwrap())
            .sum();
        assert_eq!(records, counted);
    }

    #[test]
    fn missing_input_is_io_error() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .args(["extract", "/nonexistent/giftscore-data"])
            .assert()
            .code(21);
    }

    #[test]
    fn unknown_subcommand_is_args_error() {
        let home = tempfile::tempdir().unwrap();
        giftscore(home.path())
            .arg("plot")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }
}
