//! Run an external spike sorter over a staged recording.
//!
//! Drives the full adapter lifecycle: parameter merge and validation, input
//! staging into the output folder, blocking invocation of the external tool,
//! and result retrieval.

use anyhow::Result;
use clap::Parser;
use log::info;

use spikesort_lib::recording::{load_recording, Recording};
use spikesort_lib::sorter::{run_sorter, sorter_by_name};

use crate::commands::command::Command;
use crate::commands::common::{OutputOptions, ParamOptions, RecordingOptions};

/// Run an external spike sorter on a recording.
#[derive(Debug, Parser)]
#[command(
    name = "run",
    about = "\x1b[38;5;166m[SORTING]\x1b[0m        \x1b[36mRun an external spike sorter on a recording\x1b[0m",
    long_about = r#"
Run an external spike sorter on a recording.

The recording is given as a serialized recording description (the
spikeinterface_recording.json written by staging or by the stage command).
It is re-staged into <output>/bin_folder, the external sorter runs on the
staged copy, and results land in <output>/output.

The sorter must be installed out-of-band; `spikesort sorters` shows what is
available on this machine.

Example usage:
  spikesort run -r staged/spikeinterface_recording.json -o sorting_out
  spikesort run -r rec.json -o out -s pykilosort --set nblocks=0 --set Th=[12,5]
  spikesort run -r rec.json -o out -p my_params.json --verbose
"#
)]
pub struct Run {
    /// Recording input options
    #[command(flatten)]
    pub recording: RecordingOptions,

    /// Output folder options
    #[command(flatten)]
    pub output: OutputOptions,

    /// Sorter to run
    #[arg(short = 's', long = "sorter", default_value = "pykilosort")]
    pub sorter: String,

    /// Parameter overrides
    #[command(flatten)]
    pub params: ParamOptions,

    /// Forward the sorter's own progress output
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    pub verbose: bool,
}

impl Command for Run {
    fn execute(&self) -> Result<()> {
        self.recording.validate()?;
        let sorter = sorter_by_name(&self.sorter)?;
        let user_params = self.params.collect()?;
        let recording = load_recording(&self.recording.recording)?;

        info!("Sorter: {}", sorter.name());
        info!("Recording: {}", self.recording.recording.display());
        info!(
            "  {} channel(s) at {} Hz, dtype {}",
            recording.num_channels(),
            recording.sampling_frequency(),
            recording.dtype()
        );
        info!("Output folder: {}", self.output.output.display());
        if !user_params.is_empty() {
            info!("Parameter overrides: {}", user_params.len());
        }

        let result =
            run_sorter(sorter.as_ref(), &recording, &self.output.output, &user_params, self.verbose)?;

        info!("Sorting results available in {}", result.folder().display());
        Ok(())
    }
}
