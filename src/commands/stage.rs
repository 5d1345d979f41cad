//! Stage a recording into the binary representation without running a sorter.

use anyhow::Result;
use clap::Parser;
use log::info;

use spikesort_lib::recording::{load_recording, save_binary, Recording};

use crate::commands::command::Command;
use crate::commands::common::{OutputOptions, RecordingOptions};

/// Stage a recording into a binary folder.
#[derive(Debug, Parser)]
#[command(
    name = "stage",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mStage a recording into a binary folder\x1b[0m",
    long_about = r#"
Stage a recording into the single-file binary representation.

Writes one contiguous frame-major raw file per segment plus a serialized
recording description into the output folder. This is the same staging the
run command performs into <output>/bin_folder, exposed as a standalone
utility.

Example usage:
  spikesort stage -r rec.json -o staged/
"#
)]
pub struct Stage {
    /// Recording input options
    #[command(flatten)]
    pub recording: RecordingOptions,

    /// Output folder options
    #[command(flatten)]
    pub output: OutputOptions,
}

impl Command for Stage {
    fn execute(&self) -> Result<()> {
        self.recording.validate()?;
        let recording = load_recording(&self.recording.recording)?;

        let staged = save_binary(&recording, &self.output.output)?;

        for (segment_index, path) in staged.file_paths().iter().enumerate() {
            let bytes = std::fs::metadata(path)?.len();
            info!("Segment {segment_index}: {} ({bytes} bytes)", path.display());
        }
        info!("Staged {} segment(s) into {}", staged.num_segments(), self.output.output.display());
        Ok(())
    }
}
