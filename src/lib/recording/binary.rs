//! File-backed binary recordings, staging and reload.
//!
//! The binary representation is the SpikeInterface on-disk convention: one
//! contiguous frame-major raw file per segment named
//! `traces_cached_seg<i>.raw`, next to a JSON description named
//! `spikeinterface_recording.json`. Folders staged here are readable by
//! SpikeInterface-based tooling and vice versa.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dtype::SampleDtype;
use crate::errors::{Result, SpikesortError};
use crate::recording::Recording;

/// File name of the serialized recording description inside a staged folder.
pub const RECORDING_DESCRIPTION_FILENAME: &str = "spikeinterface_recording.json";

/// Format tag of single-file binary recordings in serialized descriptions.
pub const BINARY_FORMAT: &str = "binary";

/// File name of the raw binary data for the given segment.
fn segment_file_name(segment_index: usize) -> String {
    format!("traces_cached_seg{segment_index}.raw")
}

/// Serialized description of a binary recording.
///
/// This is the document written next to the staged raw files and reloaded
/// before invocation. Reloading from the persisted description, rather than
/// reusing the in-memory object that produced it, guards against the
/// description and the binary diverging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingDescription {
    /// Representation tag; only [`BINARY_FORMAT`] can be reloaded
    pub format: String,
    /// One raw file per segment
    pub file_paths: Vec<PathBuf>,
    /// Number of channels
    pub num_channels: usize,
    /// Sample storage format
    pub dtype: SampleDtype,
    /// Sampling frequency in Hz
    pub sampling_frequency: f64,
    /// Per-channel `[x, y]` probe coordinates
    pub channel_locations: Vec<[f64; 2]>,
    /// Number of samples per segment
    pub num_samples: Vec<u64>,
}

/// A recording backed by one contiguous raw binary file per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRecording {
    file_paths: Vec<PathBuf>,
    num_channels: usize,
    dtype: SampleDtype,
    sampling_frequency: f64,
    channel_locations: Vec<[f64; 2]>,
    num_samples: Vec<u64>,
}

impl BinaryRecording {
    /// Builds a recording from a parsed description.
    ///
    /// # Errors
    /// Returns an error if the description's format tag is not
    /// [`BINARY_FORMAT`] or its fields are inconsistent with each other.
    /// Referenced raw files are not checked for existence here; a missing
    /// file surfaces when the data is read.
    pub fn from_description(description: RecordingDescription, source: &Path) -> Result<Self> {
        let invalid = |reason: String| SpikesortError::InvalidFileFormat {
            file_type: "recording description".to_string(),
            path: source.display().to_string(),
            reason,
        };
        if description.format != BINARY_FORMAT {
            return Err(invalid(format!(
                "unsupported recording format '{}'; only single-file binary recordings can be reloaded",
                description.format
            )));
        }
        if description.file_paths.is_empty() {
            return Err(invalid("no segment files listed".to_string()));
        }
        if description.file_paths.len() != description.num_samples.len() {
            return Err(invalid(format!(
                "{} segment files but {} sample counts",
                description.file_paths.len(),
                description.num_samples.len()
            )));
        }
        if description.channel_locations.len() != description.num_channels {
            return Err(invalid(format!(
                "{} channels but {} channel locations",
                description.num_channels,
                description.channel_locations.len()
            )));
        }
        Ok(Self {
            file_paths: description.file_paths,
            num_channels: description.num_channels,
            dtype: description.dtype,
            sampling_frequency: description.sampling_frequency,
            channel_locations: description.channel_locations,
            num_samples: description.num_samples,
        })
    }

    /// The raw binary file backing each segment.
    #[must_use]
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }

    /// The serialized description of this recording.
    #[must_use]
    pub fn description(&self) -> RecordingDescription {
        RecordingDescription {
            format: BINARY_FORMAT.to_string(),
            file_paths: self.file_paths.clone(),
            num_channels: self.num_channels,
            dtype: self.dtype,
            sampling_frequency: self.sampling_frequency,
            channel_locations: self.channel_locations.clone(),
            num_samples: self.num_samples.clone(),
        }
    }
}

impl Recording for BinaryRecording {
    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn num_segments(&self) -> usize {
        self.file_paths.len()
    }

    fn num_samples(&self, segment_index: usize) -> u64 {
        self.num_samples[segment_index]
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn dtype(&self) -> SampleDtype {
        self.dtype
    }

    fn channel_locations(&self) -> &[[f64; 2]] {
        &self.channel_locations
    }

    fn write_segment(&self, segment_index: usize, out: &mut dyn Write) -> std::io::Result<u64> {
        let file = File::open(&self.file_paths[segment_index])?;
        let mut reader = BufReader::new(file);
        std::io::copy(&mut reader, out)
    }
}

/// Stages a recording into `folder` as the binary representation.
///
/// Writes one `traces_cached_seg<i>.raw` file per segment (frame-major, in
/// the recording's dtype) and a `spikeinterface_recording.json` description
/// referencing them. Each segment file is exactly
/// `num_channels * num_samples * dtype width` bytes.
///
/// # Errors
/// Returns an error if the folder cannot be created, a file cannot be
/// written, or a segment produces a different byte count than its declared
/// shape implies.
pub fn save_binary(recording: &dyn Recording, folder: &Path) -> Result<BinaryRecording> {
    std::fs::create_dir_all(folder).map_err(|e| SpikesortError::io(folder, e))?;

    let num_channels = recording.num_channels();
    let dtype = recording.dtype();
    let mut file_paths = Vec::with_capacity(recording.num_segments());
    let mut num_samples = Vec::with_capacity(recording.num_segments());

    for segment_index in 0..recording.num_segments() {
        let path = folder.join(segment_file_name(segment_index));
        let file = File::create(&path).map_err(|e| SpikesortError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        let written = recording
            .write_segment(segment_index, &mut writer)
            .and_then(|written| writer.flush().map(|()| written))
            .map_err(|e| SpikesortError::io(&path, e))?;

        let samples = recording.num_samples(segment_index);
        let expected = samples * (num_channels * dtype.num_bytes()) as u64;
        if written != expected {
            return Err(SpikesortError::UnsupportedRecording {
                reason: format!(
                    "segment {segment_index} wrote {written} bytes, expected {expected}"
                ),
            });
        }
        file_paths.push(path);
        num_samples.push(samples);
    }

    let description = RecordingDescription {
        format: BINARY_FORMAT.to_string(),
        file_paths,
        num_channels,
        dtype,
        sampling_frequency: recording.sampling_frequency(),
        channel_locations: recording.channel_locations().to_vec(),
        num_samples,
    };
    let description_path = folder.join(RECORDING_DESCRIPTION_FILENAME);
    let file =
        File::create(&description_path).map_err(|e| SpikesortError::io(&description_path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &description).map_err(|e| {
        SpikesortError::InvalidFileFormat {
            file_type: "recording description".to_string(),
            path: description_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    BinaryRecording::from_description(description, &description_path)
}

/// Re-opens a binary recording from its serialized description.
///
/// # Errors
/// Returns an error if the description cannot be read or parsed, or if it
/// does not describe a single-file binary recording.
pub fn load_recording(description_path: &Path) -> Result<BinaryRecording> {
    let text = std::fs::read_to_string(description_path)
        .map_err(|e| SpikesortError::io(description_path, e))?;
    let description: RecordingDescription =
        serde_json::from_str(&text).map_err(|e| SpikesortError::InvalidFileFormat {
            file_type: "recording description".to_string(),
            path: description_path.display().to_string(),
            reason: e.to_string(),
        })?;
    BinaryRecording::from_description(description, description_path)
}
