//! Integration tests for the pykilosort adapter lifecycle.
//!
//! The external tool is not expected to be installed while these run; every
//! test exercises the adapter's own glue behavior up to (but never across)
//! the external invocation.

use std::path::Path;

use tempfile::TempDir;

use spikesort_lib::recording::{load_recording, Recording, RECORDING_DESCRIPTION_FILENAME};
use spikesort_lib::sorter::pykilosort::{KsProbe, BIN_FOLDER};
use spikesort_lib::sorter::{run_sorter, PyKilosortSorter, Sorter, SorterParams};
use spikesort_lib::SpikesortError;

use crate::helpers::{linear_probe_locations, single_segment_recording, two_segment_recording};

#[test]
fn test_staged_binary_has_exact_size() {
    let temp_dir = TempDir::new().unwrap();
    let output_folder = temp_dir.path().join("sorting");
    let sorter = PyKilosortSorter;
    // 7 channels, 100 samples of int16
    let recording = single_segment_recording(7, 100);

    sorter.setup_recording(&recording, &output_folder, &sorter.default_params(), false).unwrap();

    let bin_folder = output_folder.join(BIN_FOLDER);
    let raw = bin_folder.join("traces_cached_seg0.raw");
    assert_eq!(std::fs::metadata(&raw).unwrap().len(), 7 * 100 * 2);

    // The description next to it reloads to the same shape and points at
    // the staged file
    let reloaded = load_recording(&bin_folder.join(RECORDING_DESCRIPTION_FILENAME)).unwrap();
    assert_eq!(reloaded.num_channels(), 7);
    assert_eq!(reloaded.num_samples(0), 100);
    assert_eq!(reloaded.file_paths().len(), 1);
    assert_eq!(reloaded.file_paths()[0], raw);
}

#[test]
#[should_panic(expected = "multi-segment recordings are not supported")]
fn test_multi_segment_invocation_fails_before_external_call() {
    let temp_dir = TempDir::new().unwrap();
    let output_folder = temp_dir.path().join("sorting");
    let sorter = PyKilosortSorter;
    let recording = two_segment_recording(4, 10);

    sorter.setup_recording(&recording, &output_folder, &sorter.default_params(), false).unwrap();
    let _ = sorter.run_from_folder(&output_folder, &sorter.default_params(), false);
}

#[test]
fn test_probe_descriptor_splits_location_columns() {
    let locations = linear_probe_locations(5);
    let probe = KsProbe::from_channel_locations(&locations);

    assert_eq!(probe.nchan_tot, 5);
    assert_eq!(probe.chan_map, vec![0, 1, 2, 3, 4]);
    assert_eq!(probe.kcoords, vec![1.0; 5]);
    assert_eq!(probe.xc, locations.iter().map(|loc| loc[0]).collect::<Vec<_>>());
    assert_eq!(probe.yc, locations.iter().map(|loc| loc[1]).collect::<Vec<_>>());
}

#[test]
fn test_check_params_returns_mapping_unchanged() {
    let sorter = PyKilosortSorter;
    let recording = single_segment_recording(4, 10);
    let mut params = SorterParams::new();
    params.insert("stable_mode", serde_json::json!(false));
    params.insert("Th", serde_json::json!([9, 3]));
    params.insert("fslow", serde_json::Value::Null);

    let checked = sorter.check_params(&recording, Path::new("/tmp/out"), params.clone()).unwrap();
    assert_eq!(checked, params);
}

#[test]
fn test_availability_and_version_when_tool_is_absent() {
    // The suite runs on machines without pykilosort installed; the probe
    // must say so and the version query must fail, not return a placeholder
    let sorter = PyKilosortSorter;
    if sorter.is_installed() {
        return;
    }
    let version = sorter.version();
    assert!(version.is_err());
}

#[test]
fn test_result_points_at_output_regardless_of_existence() {
    let sorter = PyKilosortSorter;
    let reader = sorter.result_from_folder(Path::new("/no/such/folder"));
    assert_eq!(reader.folder(), Path::new("/no/such/folder/output"));
}

#[test]
fn test_run_sorter_gates_on_installation() {
    let sorter = PyKilosortSorter;
    if sorter.is_installed() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let recording = single_segment_recording(4, 10);

    let result = run_sorter(
        &sorter,
        &recording,
        &temp_dir.path().join("sorting"),
        &SorterParams::new(),
        false,
    );
    match result {
        Err(SpikesortError::SorterNotInstalled { name, help }) => {
            assert_eq!(name, "pykilosort");
            assert!(help.contains("cupy"));
        }
        other => panic!("expected SorterNotInstalled, got {other:?}"),
    }
}

#[test]
fn test_run_sorter_rejects_undeclared_override() {
    // Merging happens after the installed gate, so exercise it directly
    let sorter = PyKilosortSorter;
    let mut overrides = SorterParams::new();
    overrides.insert("Thh", serde_json::json!([10, 4]));

    let result = sorter.default_params().merged_with(&overrides);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Thh"));
}
