//! Integration tests for the sorters listing command.

use std::process::Command;

#[test]
fn test_sorters_lists_pykilosort() {
    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .arg("sorters")
        .output()
        .expect("Failed to run sorters command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pykilosort"), "stdout was: {stdout}");
    assert!(stdout.contains("port of kilosort"), "stdout was: {stdout}");
}

#[test]
fn test_sorters_help_missing_prints_installation_help() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args(["sorters", "--help-missing"])
        .env("PATH", temp_dir.path()) // nothing installed here
        .output()
        .expect("Failed to run sorters command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not installed"), "stdout was: {stdout}");
    assert!(stdout.contains("cupy"), "stdout was: {stdout}");
}
