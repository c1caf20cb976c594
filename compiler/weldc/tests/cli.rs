// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests of the `weld` binary: exit status, where output goes,
//! and that a failed run writes nothing.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn weld(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_weld"))
        .args(args)
        .env_remove("WELD_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("weld binary runs")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn help_and_version_succeed() {
    let help = weld(&["help"]);
    assert!(help.status.success());
    assert!(String::from_utf8_lossy(&help.stdout).contains("Usage: weld"));

    let version = weld(&["--version"]);
    assert!(version.status.success());
    assert!(String::from_utf8_lossy(&version.stdout).starts_with("weld "));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let out = weld(&["--frobnicate", path_arg(&fixture("shapes.decls.json"))]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown flag `--frobnicate`"));
}

#[test]
fn invalid_pattern_is_a_usage_error() {
    let out = weld(&["--deny", "(", path_arg(&fixture("shapes.decls.json"))]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn writes_to_stdout_by_default() {
    let out = weld(&[path_arg(&fixture("shapes.decls.json"))]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("// Generated by weld. Do not edit.\n"));
    assert!(stdout.contains("pub struct shape {"), "{stdout}");
    assert!(stdout.contains("pub fn shape_area(s: *const shape) -> f64;"), "{stdout}");
    // The directives restrict selection to `shape` and its dependencies.
    assert!(!stdout.contains("unrelated"), "{stdout}");
    assert!(!stdout.contains("size_of"), "{stdout}");
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("shapes.rs");
    let out = weld(&[
        "-o",
        path_arg(&output),
        path_arg(&fixture("shapes.decls.json")),
    ]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("pub enum kind {"), "{written}");
}

#[test]
fn failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("broken.rs");
    let out = weld(&[
        "-o",
        path_arg(&output),
        path_arg(&fixture("broken.decls.json")),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("E0002"), "{stderr}");
}

#[test]
fn missing_input_exits_with_failure() {
    let out = weld(&["/nonexistent/weld/missing.decls.json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("E0001"));
}

#[test]
fn several_inputs_go_to_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.decls.json");
    let second = dir.path().join("second.decls.json");
    let shapes = std::fs::read_to_string(fixture("shapes.decls.json")).unwrap();
    std::fs::write(&first, &shapes).unwrap();
    std::fs::write(&second, &shapes).unwrap();
    let out_dir = dir.path().join("bindings");

    let out = weld(&["-o", path_arg(&out_dir), path_arg(&first), path_arg(&second)]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    let a = std::fs::read_to_string(out_dir.join("first.rs")).unwrap();
    let b = std::fs::read_to_string(out_dir.join("second.rs")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn one_failure_does_not_stop_other_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("bindings");
    std::fs::create_dir(&out_dir).unwrap();

    let out = weld(&[
        "-o",
        path_arg(&out_dir),
        path_arg(&fixture("shapes.decls.json")),
        path_arg(&fixture("broken.decls.json")),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out_dir.join("shapes.rs").exists());
    assert!(!out_dir.join("broken.rs").exists());
}

#[test]
fn output_file_with_several_inputs_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("taken.rs");
    std::fs::write(&file, "").unwrap();
    let shapes = fixture("shapes.decls.json");
    let out = weld(&["-o", path_arg(&file), path_arg(&shapes), path_arg(&shapes)]);
    assert_eq!(out.status.code(), Some(2));
}
