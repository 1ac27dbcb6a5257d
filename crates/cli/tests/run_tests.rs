// Integration tests for the `devrecon` binary: console notices, exit codes, output files.
// Run with: cargo test -p devrecon-cli --test run_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Data, Reader, Sheets};

fn devrecon(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_devrecon"));
    cmd.current_dir(dir);
    for var in [
        "DEVRECON_JSON",
        "DEVRECON_XLSX",
        "DEVRECON_OUTPUT",
        "DEVRECON_BATCH_SIZE",
        "DEVRECON_COLUMN",
        "DEVRECON_SHEET",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_reference(path: &Path, header: &str, ids: &[&str]) {
    let mut wb = rust_xlsxwriter::Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, header).unwrap();
    for (i, id) in ids.iter().enumerate() {
        ws.write_string((i + 1) as u32, 0, *id).unwrap();
    }
    wb.save(path).unwrap();
}

fn read_rows(path: &Path) -> Vec<Vec<Data>> {
    let mut wb: Sheets<_> = open_workbook_auto(path).unwrap();
    let name = wb.sheet_names()[0].clone();
    let range = wb.worksheet_range(&name).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const WORKED_EXAMPLE: &str = r#"[
  {"DeviceId":"A1","ComputerName":"PC1","USBDevice":"USB-X"},
  {"DeviceId":"A2","ComputerName":"PC2","USBDevice":"USB-Y"},
  {"ComputerName":"PC3","USBDevice":"USB-Z"}
]"#;

// ---------------------------------------------------------------------------
// Default paths: input.json + input.xlsx -> output.xlsx in the working dir
// ---------------------------------------------------------------------------

#[test]
fn default_paths_worked_example() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.json"), WORKED_EXAMPLE).unwrap();
    write_reference(&dir.path().join("input.xlsx"), "Combined ID Serial Number", &["A1"]);

    let output = devrecon(dir.path()).output().expect("run devrecon");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let err = stderr(&output);
    assert!(err.contains("Loading JSON data..."));
    assert!(err.contains("Loading Excel data..."));
    assert!(err.contains("Saving 1 unmatched records to Excel..."));
    assert!(err.contains("output.xlsx"));

    let rows = read_rows(&dir.path().join("output.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            Data::String("DeviceId".into()),
            Data::String("ComputerName".into()),
            Data::String("USBDevice".into()),
        ]
    );
    assert_eq!(
        rows[1],
        vec![
            Data::String("A2".into()),
            Data::String("PC2".into()),
            Data::String("USB-Y".into()),
        ]
    );
}

#[test]
fn duplicate_keys_and_long_text_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let long = "U".repeat(40_000);
    std::fs::write(
        dir.path().join("input.json"),
        format!(
            r#"[{{"DeviceId":"A1","DeviceId":"A2","ComputerName":"PC2","USBDevice":"{long}"}},
                {{"DeviceId":false,"ComputerName":"PC3"}},
                {{"DeviceId":[],"ComputerName":"PC4"}}]"#
        ),
    )
    .unwrap();
    write_reference(&dir.path().join("input.xlsx"), "Combined ID Serial Number", &["A1"]);

    let output = devrecon(dir.path()).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let rows = read_rows(&dir.path().join("output.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], Data::String("A2".into()));
    match &rows[1][2] {
        Data::String(s) => assert_eq!(s.len(), 32_767),
        other => panic!("expected text cell, got {other:?}"),
    }
}

#[test]
fn no_unmatched_records_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.json"), r#"[{"DeviceId":"A1"},{"DeviceId":""}]"#).unwrap();
    write_reference(&dir.path().join("input.xlsx"), "Combined ID Serial Number", &["A1"]);

    let output = devrecon(dir.path()).output().unwrap();
    assert!(output.status.success());
    assert!(stderr(&output).contains("No unmatched records found."));
    assert!(!dir.path().join("output.xlsx").exists());
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

#[test]
fn splits_into_numbered_parts() {
    let dir = tempfile::tempdir().unwrap();
    let devices: Vec<String> = (0..5)
        .map(|i| format!(r#"{{"DeviceId":"D{i}","ComputerName":"PC{i}","USBDevice":"U{i}"}}"#))
        .collect();
    std::fs::write(dir.path().join("devices.json"), format!("[{}]", devices.join(","))).unwrap();
    write_reference(&dir.path().join("serials.xlsx"), "Combined ID Serial Number", &["D2"]);

    let output = devrecon(dir.path())
        .args([
            "--json", "devices.json",
            "--xlsx", "serials.xlsx",
            "--output", "unmatched.xlsx",
            "--batch-size", "3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let err = stderr(&output);
    assert!(err.contains("Batch saved to unmatched_part1.xlsx"));
    assert!(err.contains("Batch saved to unmatched_part2.xlsx"));
    assert!(!dir.path().join("unmatched.xlsx").exists());
    assert!(!dir.path().join("unmatched_part3.xlsx").exists());

    let ids: Vec<Data> = ["unmatched_part1.xlsx", "unmatched_part2.xlsx"]
        .iter()
        .flat_map(|f| read_rows(&dir.path().join(f)).into_iter().skip(1).map(|r| r[0].clone()))
        .collect();
    assert_eq!(
        ids,
        ["D0", "D1", "D3", "D4"].iter().map(|s| Data::String(s.to_string())).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// Configuration sources
// ---------------------------------------------------------------------------

#[test]
fn env_vars_and_custom_column() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("d.json"), WORKED_EXAMPLE).unwrap();
    write_reference(&dir.path().join("r.xlsx"), "Serial", &["A2"]);

    let output = devrecon(dir.path())
        .env("DEVRECON_JSON", "d.json")
        .env("DEVRECON_XLSX", "r.xlsx")
        .env("DEVRECON_OUTPUT", "o.xlsx")
        .env("DEVRECON_COLUMN", "Serial")
        .arg("--quiet")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).is_empty(), "--quiet should silence notices");

    let rows = read_rows(&dir.path().join("o.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], Data::String("A1".into()));
}

#[test]
fn report_file_has_summary() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.json"), WORKED_EXAMPLE).unwrap();
    write_reference(&dir.path().join("input.xlsx"), "Combined ID Serial Number", &["A1"]);

    let output = devrecon(dir.path()).args(["--report", "run.json", "-q"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = std::fs::read_to_string(dir.path().join("run.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(report["reference_ids"], 1);
    assert_eq!(report["summary"]["total_records"], 3);
    assert_eq!(report["summary"]["matched"], 1);
    assert_eq!(report["summary"]["skipped_without_id"], 1);
    assert_eq!(report["summary"]["unmatched"], 1);
    assert_eq!(report["rows_written"], 1);
    assert_eq!(report["files"][0]["rows"], 1);
    assert_eq!(report["files"][0]["path"], "output.xlsx");
    assert!(report["meta"]["run_at"].is_string());
}

// ---------------------------------------------------------------------------
// Error exit codes
// ---------------------------------------------------------------------------

fn exit_code(dir: &Path, args: &[&str]) -> (i32, String) {
    let output = devrecon(dir).args(args).output().unwrap();
    (output.status.code().unwrap_or(-1), stderr(&output))
}

fn setup(json: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.json"), json).unwrap();
    write_reference(&dir.path().join("input.xlsx"), "Combined ID Serial Number", &["A1"]);
    let root = dir.path().to_path_buf();
    (dir, root)
}

#[test]
fn malformed_json_exits_3() {
    let (_dir, root) = setup(r#"{"DeviceId":"A1"}"#);
    let (code, err) = exit_code(&root, &[]);
    assert_eq!(code, 3);
    assert!(err.contains("error: malformed input"));
    assert!(err.contains("hint:"));
}

#[test]
fn missing_column_exits_4() {
    let (_dir, root) = setup(WORKED_EXAMPLE);
    let (code, err) = exit_code(&root, &["--column", "Asset Tag"]);
    assert_eq!(code, 4);
    assert!(err.contains("missing column 'Asset Tag'"));
    assert!(err.contains("Combined ID Serial Number"));
}

#[test]
fn missing_input_exits_5() {
    let (_dir, root) = setup(WORKED_EXAMPLE);
    let (code, err) = exit_code(&root, &["--json", "absent.json"]);
    assert_eq!(code, 5);
    assert!(err.contains("absent.json"));
}

#[test]
fn unwritable_output_exits_6() {
    let (_dir, root) = setup(WORKED_EXAMPLE);
    let (code, err) = exit_code(&root, &["--output", "no/such/dir/out.xlsx"]);
    assert_eq!(code, 6);
    assert!(err.contains("cannot write"));
}

#[test]
fn bad_batch_size_exits_2() {
    let (_dir, root) = setup(WORKED_EXAMPLE);
    let (code, err) = exit_code(&root, &["--batch-size", "0"]);
    assert_eq!(code, 2);
    assert!(err.contains("batch size"));
}
