//! Runs the `tabletalk` binary against CSV files in a temp directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Run the binary with a config path that does not exist, so defaults apply.
fn tabletalk(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabletalk"))
        .env("TABLETALK_CONFIG", dir.join("missing.toml"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let employees = write_csv(dir.path(), "Employees.csv", "id,name\n1,Ann\n2,Bo\n");
    let payroll = write_csv(dir.path(), "Payroll.csv", "emp_id,salary\n1,50000\n3,60000\n");
    (dir, employees, payroll)
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn test_inspect_json() {
    let (dir, employees, _) = fixtures();
    let output = tabletalk(
        dir.path(),
        &["inspect", employees.to_str().unwrap(), "--format", "json"],
    );
    assert!(output.status.success());

    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "Employees");
    assert_eq!(value["type"], "uploaded");
    assert_eq!(value["rowCount"], 2);
    assert_eq!(value["columns"][0]["type"], "number");
}

#[test]
fn test_merge_left_json() {
    let (dir, employees, payroll) = fixtures();
    let output = tabletalk(
        dir.path(),
        &[
            "merge",
            employees.to_str().unwrap(),
            payroll.to_str().unwrap(),
            "--on",
            "id=emp_id",
            "--join",
            "left",
            "--name",
            "Staff",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success());

    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "Staff");
    assert_eq!(value["type"], "merged");
    assert_eq!(value["rowCount"], 2);
    assert_eq!(value["data"][0]["salary"], 50000.0);
    assert!(value["data"][1]["salary"].is_null());
    assert_eq!(value["parentTables"].as_array().unwrap().len(), 2);
}

#[test]
fn test_merge_unknown_column_fails() {
    let (dir, employees, payroll) = fixtures();
    let output = tabletalk(
        dir.path(),
        &[
            "merge",
            employees.to_str().unwrap(),
            payroll.to_str().unwrap(),
            "--on",
            "id=nope",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("table 'Payroll' has no column 'nope'"));
}

#[test]
fn test_clean_text() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "gaps.csv", "qty,name\n1,Ann\n,Bo\nNA,\n");
    let output = tabletalk(dir.path(), &["clean", path.to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("gaps (table-"));
    assert!(text.contains("0\tBo"));
}

#[test]
fn test_ask_row_count_and_average() {
    let (dir, _, payroll) = fixtures();
    let path = payroll.to_str().unwrap();

    let output = tabletalk(dir.path(), &["ask", path, "How many rows?"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "There are 2 rows in this table.");

    let output = tabletalk(dir.path(), &["ask", path, "average", "--format", "json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["intent"], "average");
    assert_eq!(value["column"], "emp_id");
    assert_eq!(value["value"], 2.0);
}

#[test]
fn test_config_file_is_honoured() {
    let (dir, employees, payroll) = fixtures();
    let config = write_csv(
        dir.path(),
        "config.toml",
        "[merge]\ndefault_join = \"outer\"\ncollision_separator = \"_\"\n",
    );
    let output = Command::new(env!("CARGO_BIN_EXE_tabletalk"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "merge",
            employees.to_str().unwrap(),
            payroll.to_str().unwrap(),
            "--on",
            "id=emp_id",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["rowCount"], 3);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let output = tabletalk(dir.path(), &["inspect", "/nonexistent/table.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/table.csv"));
}

#[test]
fn test_merge_rejects_repeated_base_column() {
    let (dir, employees, payroll) = fixtures();
    let output = tabletalk(
        dir.path(),
        &[
            "merge",
            employees.to_str().unwrap(),
            payroll.to_str().unwrap(),
            "--on",
            "id=emp_id",
            "--on",
            "id=salary",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base column 'id' twice"));
}

#[test]
fn test_trailing_delimiter_upload() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "export.csv", "id,name,\n1,Ann,\n2,Bo,\n");
    let output = tabletalk(dir.path(), &["inspect", path.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["rowCount"], 2);
    assert_eq!(value["columns"][2]["accessor"], "");
}
