//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use spikesort_lib::sorter::SorterParams;

/// Input options for commands that read a staged recording description.
#[derive(Debug, Clone, Args)]
pub struct RecordingOptions {
    /// Serialized recording description (spikeinterface_recording.json)
    #[arg(short = 'r', long = "recording")]
    pub recording: PathBuf,
}

impl RecordingOptions {
    /// Validates that the recording description exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.recording.exists() {
            bail!("Recording description does not exist: {}", self.recording.display());
        }
        Ok(())
    }
}

/// Output folder option.
#[derive(Debug, Clone, Args)]
pub struct OutputOptions {
    /// Output folder
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

/// Sorter parameter overrides from a file and/or the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct ParamOptions {
    /// JSON file with a flat mapping of parameter overrides
    #[arg(short = 'p', long = "params-file")]
    pub params_file: Option<PathBuf>,

    /// Single parameter override; repeatable (e.g. --set Th=[10,4])
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,
}

impl ParamOptions {
    /// Collects overrides into one mapping, `--set` flags winning over the
    /// params file.
    ///
    /// # Errors
    ///
    /// Returns an error if the params file cannot be read or parsed, or a
    /// `--set` flag is not a NAME=VALUE assignment.
    pub fn collect(&self) -> anyhow::Result<SorterParams> {
        let mut params = match &self.params_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read params file: {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse params file: {}", path.display()))?
            }
            None => SorterParams::new(),
        };
        for assignment in &self.set {
            let (name, value) = SorterParams::parse_assignment(assignment)?;
            params.insert(name, value);
        }
        Ok(params)
    }
}
