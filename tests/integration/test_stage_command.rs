//! Integration tests for the stage command.

use std::process::Command;

use tempfile::TempDir;

use spikesort_lib::recording::{load_recording, save_binary, Recording, RECORDING_DESCRIPTION_FILENAME};

use crate::helpers::two_segment_recording;

#[test]
fn test_stage_rewrites_binary_folder() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recording = two_segment_recording(3, 25);
    let first = temp_dir.path().join("first");
    save_binary(&recording, &first).expect("staging failed");

    let second = temp_dir.path().join("second");
    let status = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "stage",
            "-r",
            first.join(RECORDING_DESCRIPTION_FILENAME).to_str().unwrap(),
            "-o",
            second.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to run stage command");

    assert!(status.success(), "Stage command failed");

    let restaged = load_recording(&second.join(RECORDING_DESCRIPTION_FILENAME)).unwrap();
    assert_eq!(restaged.num_segments(), 2);
    assert_eq!(restaged.num_channels(), 3);
    for segment in 0..2 {
        // 3 channels x 25 samples x 2 bytes per segment
        let len = std::fs::metadata(&restaged.file_paths()[segment]).unwrap().len();
        assert_eq!(len, 150);
    }
}

#[test]
fn test_stage_missing_description_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let status = Command::new(env!("CARGO_BIN_EXE_spikesort"))
        .args([
            "stage",
            "-r",
            temp_dir.path().join("absent.json").to_str().unwrap(),
            "-o",
            temp_dir.path().join("out").to_str().unwrap(),
        ])
        .status()
        .expect("Failed to run stage command");

    assert!(!status.success());
}
