//! Integration tests: run the rowpool binary and check exit codes and output.

use std::fs;
use std::process::Command;

fn rowpool() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rowpool"))
}

#[test]
fn test_help() {
    let out = rowpool().arg("--help").output().unwrap();
    assert!(out.status.success(), "rowpool --help should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("head"));
    assert!(stdout.contains("headers"));
    assert!(stdout.contains("convert"));
}

#[test]
fn test_version() {
    let out = rowpool().arg("--version").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("rowpool"));
}

#[test]
fn test_head_prints_leading_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "name,age\nAnn,34\nLee,40\n").unwrap();

    let out = rowpool()
        .args(["head", path.to_str().unwrap(), "-n", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name,age"));
    assert!(stdout.contains("Ann,34"));
    assert!(!stdout.contains("Lee,40"));
}

#[test]
fn test_head_named_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "First Name,Last-Name\nAnn,Lee\n").unwrap();

    let out = rowpool()
        .args(["head", path.to_str().unwrap(), "--named", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("\"first_name\""));
    assert!(stdout.contains("\"Ann\""));
}

#[test]
fn test_headers_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "First Name,Last-Name\nAnn,Lee\n").unwrap();

    let out = rowpool()
        .args(["headers", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("first_name"));
    assert!(stdout.contains("last_name"));
}

#[test]
fn test_convert_rewrites_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "a,b\n1,2\n").unwrap();

    let out = rowpool()
        .args(["convert", path.to_str().unwrap(), "--out-delimiter", ";"])
        .output()
        .unwrap();
    assert!(out.status.success(), "convert should succeed");

    let converted = dir.path().join("data.out.csv");
    let content = fs::read_to_string(&converted).unwrap();
    assert_eq!(content, "a;b\n1;2\n");
}

#[test]
fn test_convert_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.csv");
    fs::write(&good, "a,b\n").unwrap();
    let missing = dir.path().join("missing.csv");

    let out = rowpool()
        .args([
            "convert",
            good.to_str().unwrap(),
            missing.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(!out.status.success(), "batch with a missing file should fail");
    // the good file still converted
    assert!(dir.path().join("good.out.csv").exists());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing.csv"));
}

#[test]
fn test_head_missing_file_fails() {
    let out = rowpool()
        .args(["head", "definitely-not-here.csv"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}
