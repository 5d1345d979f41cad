//! The common sorter contract and the driver that runs it.
//!
//! A [`Sorter`] adapts one external spike-sorting tool to four lifecycle
//! hooks the framework calls in a fixed order: parameter validation, input
//! staging, invocation, and result retrieval. The hooks are stateless with
//! respect to each other; the only thing they share is the output-folder
//! path convention. [`run_sorter`] is the driver that calls them in order.

pub mod params;
pub mod pykilosort;

pub use params::SorterParams;
pub use pykilosort::PyKilosortSorter;

use std::path::Path;

use crate::errors::{Result, SpikesortError};
use crate::logging::OperationTimer;
use crate::recording::Recording;
use crate::sorting::PhySortingReader;

/// Which parallel execution strategies a sorter may be combined with when
/// the driving framework runs several sorts at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelCompatibility {
    /// Freshly spawned worker processes
    pub spawned_processes: bool,
    /// Forked worker processes
    pub forked_processes: bool,
    /// Threads within one process
    pub threads: bool,
}

/// An adapter from one external spike sorter to the common contract.
///
/// Implementations contain no algorithmic content; filtering, whitening,
/// drift correction, and clustering all happen inside the wrapped tool.
pub trait Sorter: std::fmt::Debug {
    /// Registry name of this sorter.
    fn name(&self) -> &'static str;

    /// One-line human description.
    fn description(&self) -> &'static str;

    /// Installation instructions for the external tool.
    fn installation_help(&self) -> &'static str;

    /// Whether the external tool needs a GPU.
    fn requires_gpu(&self) -> bool {
        false
    }

    /// Whether the adapter accepts multi-segment recordings.
    fn handles_multi_segment(&self) -> bool {
        false
    }

    /// Parallel execution strategies this adapter tolerates.
    fn parallel_compatibility(&self) -> ParallelCompatibility {
        ParallelCompatibility { spawned_processes: true, forked_processes: false, threads: false }
    }

    /// Whether the external tool is present on this machine.
    ///
    /// A pure capability probe with no side effects, evaluated fresh on
    /// every call so environment changes between calls are observed.
    fn is_installed(&self) -> bool;

    /// The external tool's own version string.
    ///
    /// # Errors
    /// Fails if the tool is absent; callers are expected to have checked
    /// [`is_installed`](Self::is_installed) first.
    fn version(&self) -> Result<String>;

    /// The full declared option table with default values.
    fn default_params(&self) -> SorterParams;

    /// A human-readable description for each declared option.
    fn param_descriptions(&self) -> &'static [(&'static str, &'static str)];

    /// Validates the merged parameters for a run.
    ///
    /// # Errors
    /// Adapter-specific; the pykilosort adapter accepts any mapping
    /// unchanged.
    fn check_params(
        &self,
        recording: &dyn Recording,
        output_folder: &Path,
        params: SorterParams,
    ) -> Result<SorterParams>;

    /// Stages the recording into `output_folder` in the layout the external
    /// tool consumes.
    ///
    /// # Errors
    /// Returns an error if staging to disk fails.
    fn setup_recording(
        &self,
        recording: &dyn Recording,
        output_folder: &Path,
        params: &SorterParams,
        verbose: bool,
    ) -> Result<()>;

    /// Invokes the external tool on the staged folder, blocking until it
    /// completes or fails.
    ///
    /// # Errors
    /// Propagates the external tool's failure unmodified; no retries.
    fn run_from_folder(&self, output_folder: &Path, params: &SorterParams, verbose: bool)
        -> Result<()>;

    /// A reader over the results the external tool left in `output_folder`.
    ///
    /// The returned reader is not validated here; a missing or malformed
    /// output directory surfaces when the reader is used.
    fn result_from_folder(&self, output_folder: &Path) -> PhySortingReader;
}

/// Names of all registered sorters.
pub const SORTER_NAMES: &[&str] = &[pykilosort::SORTER_NAME];

/// Looks up a registered sorter by name.
///
/// # Errors
/// Returns an error if no sorter is registered under `name`.
pub fn sorter_by_name(name: &str) -> Result<Box<dyn Sorter>> {
    match name {
        pykilosort::SORTER_NAME => Ok(Box::new(PyKilosortSorter)),
        _ => Err(SpikesortError::UnknownSorter { name: name.to_string() }),
    }
}

/// All registered sorters, in registry order.
#[must_use]
pub fn all_sorters() -> Vec<Box<dyn Sorter>> {
    SORTER_NAMES.iter().filter_map(|name| sorter_by_name(name).ok()).collect()
}

/// Runs a sorter over a recording, driving the lifecycle hooks in order.
///
/// The fixed order is: installed gate, parameter merge, `check_params`,
/// `setup_recording`, `run_from_folder`, `result_from_folder`. User
/// parameters are merged over the adapter's declared defaults before
/// validation.
///
/// # Errors
/// Returns an error if the sorter is not installed, an override names an
/// undeclared option, staging fails, or the external tool fails.
pub fn run_sorter(
    sorter: &dyn Sorter,
    recording: &dyn Recording,
    output_folder: &Path,
    user_params: &SorterParams,
    verbose: bool,
) -> Result<PhySortingReader> {
    if !sorter.is_installed() {
        return Err(SpikesortError::SorterNotInstalled {
            name: sorter.name().to_string(),
            help: sorter.installation_help().to_string(),
        });
    }

    let params = sorter.default_params().merged_with(user_params)?;
    let params = sorter.check_params(recording, output_folder, params)?;

    std::fs::create_dir_all(output_folder).map_err(|e| SpikesortError::io(output_folder, e))?;

    log::info!(
        "Staging {} channel(s), {} segment(s) into {}",
        recording.num_channels(),
        recording.num_segments(),
        output_folder.display()
    );
    sorter.setup_recording(recording, output_folder, &params, verbose)?;

    let timer = OperationTimer::new(&format!("Running {}", sorter.name()));
    sorter.run_from_folder(output_folder, &params, verbose)?;
    timer.log_completion();

    Ok(sorter.result_from_folder(output_folder))
}
