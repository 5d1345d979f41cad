//! Integration tests for the run command.

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

use spikesort_lib::recording::{save_binary, RECORDING_DESCRIPTION_FILENAME};

use crate::helpers::single_segment_recording;

/// Stages a small recording and returns the description path.
fn staged_description(temp_dir: &TempDir) -> PathBuf {
    let recording = single_segment_recording(4, 50);
    let folder = temp_dir.path().join("staged");
    save_binary(&recording, &folder).expect("staging failed");
    folder.join(RECORDING_DESCRIPTION_FILENAME)
}

#[test]
fn test_run_without_installed_sorter_fails_with_help() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let description = staged_description(&temp_dir);
    let output_folder = temp_dir.path().join("sorting");

    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "run",
            "-r",
            description.to_str().unwrap(),
            "-o",
            output_folder.to_str().unwrap(),
        ])
        .env("PATH", temp_dir.path()) // nothing installed here
        .output()
        .expect("Failed to run command");

    assert!(!output.status.success(), "run must fail without the external sorter");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not installed"), "stderr was: {stderr}");
}

#[test]
fn test_run_with_unknown_sorter_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let description = staged_description(&temp_dir);

    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "run",
            "-r",
            description.to_str().unwrap(),
            "-o",
            temp_dir.path().join("sorting").to_str().unwrap(),
            "-s",
            "kilosort9",
        ])
        .output()
        .expect("Failed to run command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown sorter"), "stderr was: {stderr}");
}

#[test]
fn test_run_with_missing_recording_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "run",
            "-r",
            temp_dir.path().join("absent.json").to_str().unwrap(),
            "-o",
            temp_dir.path().join("sorting").to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "stderr was: {stderr}");
}

#[test]
fn test_run_with_undeclared_override_fails_before_staging() {
    // A fake sorter executable makes the installed gate pass, so the
    // parameter merge is what fails
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let description = staged_description(&temp_dir);
    let output_folder = temp_dir.path().join("sorting");
    write_fake_sorter(temp_dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "run",
            "-r",
            description.to_str().unwrap(),
            "-o",
            output_folder.to_str().unwrap(),
            "--set",
            "not_an_option=1",
        ])
        .env("PATH", temp_dir.path())
        .output()
        .expect("Failed to run command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not_an_option"), "stderr was: {stderr}");
    assert!(!output_folder.exists(), "nothing should be staged after a parameter error");
}

#[cfg(unix)]
fn write_fake_sorter(dir: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("pykilosort");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn write_fake_sorter(dir: &std::path::Path) {
    std::fs::write(dir.join("pykilosort"), "").unwrap();
}

#[cfg(unix)]
#[test]
fn test_run_end_to_end_with_fake_sorter() {
    // A stand-in executable lets the whole lifecycle run: stage, invoke,
    // read back the results the "sorter" wrote
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let description = staged_description(&temp_dir);
    let output_folder = temp_dir.path().join("sorting");

    // The fake tool checks its job file exists and writes an empty-but-valid
    // phy output folder
    let fixture_source = {
        let fixture = temp_dir.path().join("fixture");
        crate::helpers::create_phy_output(&fixture, &[10, 20, 30], &[0, 1, 0]);
        fixture
    };
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 'pykilosort 1.4.0'; exit 0; fi\n\
         mkdir -p {out}/output\ncp {fixture}/* {out}/output/\nexit 0\n",
        out = output_folder.display(),
        fixture = fixture_source.display()
    );
    let exe = temp_dir.path().join("pykilosort");
    std::fs::write(&exe, script).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Prepend the fake tool's directory so it is found first
    let path_var =
        format!("{}:{}", temp_dir.path().display(), std::env::var("PATH").unwrap_or_default());
    let output = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "run",
            "-r",
            description.to_str().unwrap(),
            "-o",
            output_folder.to_str().unwrap(),
            "--set",
            "nblocks=0",
        ])
        .env("PATH", path_var)
        .output()
        .expect("Failed to run command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    // The recording was staged for the tool
    let bin_folder = output_folder.join("bin_folder");
    assert!(bin_folder.join(RECORDING_DESCRIPTION_FILENAME).exists());
    // 4 channels x 50 samples x 2 bytes
    let staged = bin_folder.join("traces_cached_seg0.raw");
    assert_eq!(std::fs::metadata(staged).unwrap().len(), 400);

    // The job file carried the probe and overrides
    let job: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(output_folder.join("pykilosort_job.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(job["n_channels"], 4);
    assert_eq!(job["dtype"], "int16");
    assert_eq!(job["params"]["nblocks"], 0);
    assert_eq!(job["probe"]["chanMap"], serde_json::json!([0, 1, 2, 3]));

    // And the results the tool wrote are readable
    let reader = spikesort_lib::sorting::PhySortingReader::new(output_folder.join("output"));
    assert_eq!(reader.unit_ids().unwrap(), vec![0, 1]);
}
