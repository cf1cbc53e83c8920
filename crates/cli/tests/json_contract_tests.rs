// Integration tests enforcing the --json stdout contract and exit codes.
//
// stdout from --json commands must be exactly one JSON value; summaries,
// log records and hints go to stderr.
//
// Run with: cargo test -p dentaldash-cli --test json_contract_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn dentaldash() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dentaldash"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("DENTALDASH_LOG");
    cmd
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../conciliation/tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    dentaldash().args(args).output().expect("spawn dentaldash")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &[u8]) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");

    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed)
    })
}

/// Copy the fixture CSVs into a scratch dir next to the given config text.
fn scratch_config(config: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    for csv in ["encounters.csv", "sales.csv"] {
        std::fs::copy(fixtures_dir().join(csv), dir.path().join(csv)).unwrap();
    }
    let path = dir.path().join("test.conciliation.toml");
    std::fs::write(&path, config).unwrap();
    (dir, path)
}

// ===========================================================================
// dentaldash run --json
// ===========================================================================

#[test]
fn run_json_is_single_value_with_response_shape() {
    let output = run(&["run", &fixture("march.conciliation.toml"), "--json"]);
    assert!(output.status.success(), "exit code: {:?}\nstderr: {}", output.status, stderr(&output));

    let val = assert_single_json(&output.stdout);
    let obj = val.as_object().expect("should be JSON object");
    for key in ["meta", "stats", "pagination", "records"] {
        assert!(obj.contains_key(key), "must have '{}' key", key);
    }

    assert_eq!(val["meta"]["procedure_code"], "RES");
    assert_eq!(val["stats"]["total_records"], 6);
    assert_eq!(val["stats"]["perfect_matches"], 1);
    assert_eq!(val["stats"]["total_sales_cents"], 215050);

    let records = val["records"].as_array().unwrap();
    assert_eq!(records.len(), 6);
    assert_eq!(records[0]["id"], "E-A_S-A");
    assert_eq!(records[0]["conciliation_status"], "perfect-match");
    assert_eq!(records[0]["time_difference_minutes"], 15);
    assert_eq!(records[3]["conciliation_status"], "sale-only");
    assert!(records[3].get("encounter").is_none());
}

#[test]
fn run_summary_goes_to_stderr() {
    let output = run(&["run", &fixture("march.conciliation.toml")]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "stdout must stay empty without --json");

    let err = stderr(&output);
    assert!(err.contains("6 records"), "stderr: {}", err);
    assert!(err.contains("1 perfect"), "stderr: {}", err);
    assert!(err.contains("page 1/1"), "stderr: {}", err);
}

#[test]
fn run_page_and_limit_override_config() {
    let output = run(&[
        "run",
        &fixture("march.conciliation.toml"),
        "--json",
        "--page",
        "2",
        "--limit",
        "4",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output.stdout);
    assert_eq!(val["pagination"]["current_page"], 2);
    assert_eq!(val["pagination"]["page_size"], 4);
    assert_eq!(val["pagination"]["total_pages"], 2);
    assert_eq!(val["pagination"]["has_more"], false);
    assert_eq!(val["records"].as_array().unwrap().len(), 2);
    // Stats still describe the whole result set.
    assert_eq!(val["stats"]["total_records"], 6);
}

#[test]
fn run_page_zero_is_usage_error() {
    let output = run(&["run", &fixture("march.conciliation.toml"), "--page", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("error:"));
}

#[test]
fn run_output_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result.json");

    let output = run(&[
        "run",
        &fixture("march.conciliation.toml"),
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("wrote "));

    let written = std::fs::read_to_string(&out).unwrap();
    let val: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(val["stats"]["total_records"], 6);
}

#[test]
fn run_json_stays_clean_with_debug_logging() {
    let output = dentaldash()
        .env("DENTALDASH_LOG", "debug")
        .args(["run", &fixture("march.conciliation.toml"), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_single_json(&output.stdout);
    // The unparsable E-BAD timestamp is reported while loading.
    assert!(stderr(&output).contains("E-BAD"), "stderr: {}", stderr(&output));
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn invalid_config_exits_60() {
    let (_dir, path) = scratch_config(
        "name = \"broken\"\nprocedure_code = \"\"\n\n[encounters]\nfile = \"encounters.csv\"\n\n[sales]\nfile = \"sales.csv\"\n",
    );
    let output = run(&["run", path.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(60), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_config_key_exits_60() {
    let (_dir, path) = scratch_config(
        "name = \"x\"\nprocedure_code = \"RES\"\nmatch_strategy = \"optimal\"\n\n[encounters]\nfile = \"encounters.csv\"\n\n[sales]\nfile = \"sales.csv\"\n",
    );
    let output = run(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60), "stderr: {}", stderr(&output));
}

#[test]
fn missing_csv_exits_61() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.conciliation.toml");
    std::fs::write(
        &path,
        "name = \"x\"\nprocedure_code = \"RES\"\n\n[encounters]\nfile = \"nope.csv\"\n\n[sales]\nfile = \"nope-either.csv\"\n",
    )
    .unwrap();

    let output = run(&["run", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(61), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("nope.csv"));
}

#[test]
fn missing_column_exits_61_with_hint() {
    let (_dir, path) = scratch_config(
        "name = \"x\"\nprocedure_code = \"RES\"\n\n[encounters]\nfile = \"encounters.csv\"\n\n[encounters.columns]\nrecord_id = \"encounter_id\"\n\n[sales]\nfile = \"sales.csv\"\n",
    );
    let output = run(&["run", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(61));
    let err = stderr(&output);
    assert!(err.contains("encounter_id"), "stderr: {}", err);
    assert!(err.contains("hint:"), "stderr: {}", err);
}

// ===========================================================================
// dentaldash validate
// ===========================================================================

#[test]
fn validate_accepts_fixture_config() {
    let output = run(&["validate", &fixture("march.conciliation.toml")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.starts_with("valid:"), "stderr: {}", err);
    assert!(err.contains("RES"));
}

// ===========================================================================
// dentaldash monthly
// ===========================================================================

#[test]
fn monthly_json_has_treatments_and_sales() {
    let output = run(&["monthly", &fixture("march.conciliation.toml"), "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = assert_single_json(&output.stdout);
    let treatments = val["treatments"].as_array().expect("treatments array");
    let sales = val["sales"].as_array().expect("sales array");

    // March filter keeps every procedure code, drops April and the malformed row.
    let codes: Vec<(&str, u64)> = treatments
        .iter()
        .map(|t| (t["treatment_code"].as_str().unwrap(), t["count"].as_u64().unwrap()))
        .collect();
    assert_eq!(codes, vec![("EXO", 1), ("RES", 5)]);

    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["year_month"], "2024-03");
    assert_eq!(sales[0]["total_cents"], 215050);
}

#[test]
fn monthly_text_table() {
    let output = run(&["monthly", &fixture("march.conciliation.toml")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "header + EXO + RES:\n{}", stdout);
    assert!(lines[0].starts_with("month"));
    assert!(lines[2].contains("RES"));
    assert!(lines[2].contains("2150.50"));
}
