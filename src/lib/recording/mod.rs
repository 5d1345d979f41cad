//! The framework's recording abstraction.
//!
//! A [`Recording`] is a multichannel extracellular signal: channel geometry,
//! sampling rate, sample storage format, and one or more segments of
//! frame-major raw data. Two implementations are provided:
//!
//! - [`MemoryRecording`] holds its raw frames in memory and is the natural
//!   way to synthesize data in tests and simulations.
//! - [`BinaryRecording`] is backed by one contiguous raw binary file per
//!   segment, the representation external sorters consume.
//!
//! [`save_binary`] persists any recording to the binary representation and
//! [`load_recording`] re-opens one from its serialized description.

mod binary;

pub use binary::{
    load_recording, save_binary, BinaryRecording, RecordingDescription, BINARY_FORMAT,
    RECORDING_DESCRIPTION_FILENAME,
};

use std::io::Write;

use crate::dtype::SampleDtype;
use crate::errors::{Result, SpikesortError};

/// A multichannel extracellular recording.
///
/// Raw data is frame-major: one frame is one sample for every channel, and
/// frames are laid out consecutively in time. Channel locations are 2-D
/// probe coordinates in micrometers, one `[x, y]` pair per channel.
pub trait Recording {
    /// Number of channels.
    fn num_channels(&self) -> usize;

    /// Number of segments of contiguous data.
    fn num_segments(&self) -> usize;

    /// Number of samples (frames) in the given segment.
    ///
    /// # Panics
    /// Panics if `segment_index` is out of range.
    fn num_samples(&self, segment_index: usize) -> u64;

    /// Sampling frequency in Hz.
    fn sampling_frequency(&self) -> f64;

    /// Sample storage format.
    fn dtype(&self) -> SampleDtype;

    /// Per-channel 2-D locations, one `[x, y]` pair per channel.
    fn channel_locations(&self) -> &[[f64; 2]];

    /// Streams the given segment's raw frame-major bytes into `out`.
    ///
    /// Returns the number of bytes written, which is
    /// `num_channels * num_samples(segment_index) * dtype width`.
    ///
    /// # Errors
    /// Returns any I/O error raised by the source or by `out`.
    ///
    /// # Panics
    /// Panics if `segment_index` is out of range.
    fn write_segment(&self, segment_index: usize, out: &mut dyn Write) -> std::io::Result<u64>;
}

/// An in-memory recording over frame-major raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecording {
    dtype: SampleDtype,
    sampling_frequency: f64,
    channel_locations: Vec<[f64; 2]>,
    segments: Vec<Vec<u8>>,
}

impl MemoryRecording {
    /// Creates a recording from raw frame-major segment bytes.
    ///
    /// # Errors
    /// Returns an error if there are no channels, no segments, or a
    /// segment's byte length is not a whole number of frames.
    pub fn from_raw(
        dtype: SampleDtype,
        sampling_frequency: f64,
        channel_locations: Vec<[f64; 2]>,
        segments: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if channel_locations.is_empty() {
            return Err(SpikesortError::UnsupportedRecording {
                reason: "recording has no channels".to_string(),
            });
        }
        if segments.is_empty() {
            return Err(SpikesortError::UnsupportedRecording {
                reason: "recording has no segments".to_string(),
            });
        }
        let frame_bytes = channel_locations.len() * dtype.num_bytes();
        for (index, segment) in segments.iter().enumerate() {
            if segment.len() % frame_bytes != 0 {
                return Err(SpikesortError::UnsupportedRecording {
                    reason: format!(
                        "segment {index} holds {} bytes, not a whole number of {frame_bytes}-byte frames",
                        segment.len()
                    ),
                });
            }
        }
        Ok(Self { dtype, sampling_frequency, channel_locations, segments })
    }

    /// Creates an `int16` recording from frame-major samples, one `Vec<i16>`
    /// per segment.
    ///
    /// # Errors
    /// Returns an error if a segment's length is not a whole number of
    /// frames, or the recording is empty.
    pub fn from_i16_frames(
        sampling_frequency: f64,
        channel_locations: Vec<[f64; 2]>,
        segments: &[Vec<i16>],
    ) -> Result<Self> {
        let raw = segments
            .iter()
            .map(|samples| samples.iter().flat_map(|s| s.to_le_bytes()).collect())
            .collect();
        Self::from_raw(SampleDtype::Int16, sampling_frequency, channel_locations, raw)
    }
}

impl Recording for MemoryRecording {
    fn num_channels(&self) -> usize {
        self.channel_locations.len()
    }

    fn num_segments(&self) -> usize {
        self.segments.len()
    }

    fn num_samples(&self, segment_index: usize) -> u64 {
        let frame_bytes = self.num_channels() * self.dtype.num_bytes();
        (self.segments[segment_index].len() / frame_bytes) as u64
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
        let bytes = &self.segments[segment_index];
        out.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }
}
