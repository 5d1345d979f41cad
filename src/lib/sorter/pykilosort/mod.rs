//! Adapter for the pykilosort spike sorter.
//!
//! pykilosort is an externally installed, GPU-accelerated port of Kilosort.
//! This adapter stages a recording into the layout pykilosort consumes,
//! invokes it, and hands back a reader over its phy-format output. All
//! algorithmic behavior (filtering, whitening, drift tracking, template
//! matching, clustering) happens inside the external tool.

mod runner;

pub use runner::{find_pykilosort, RunJob, JOB_FILENAME};

use std::path::Path;

use serde::Serialize;
use serde_json::json;

use crate::errors::Result;
use crate::recording::{load_recording, save_binary, Recording, RECORDING_DESCRIPTION_FILENAME};
use crate::sorter::{Sorter, SorterParams};
use crate::sorting::PhySortingReader;

/// Registry name of this sorter.
pub const SORTER_NAME: &str = "pykilosort";

/// Subfolder of the output folder holding the staged binary recording.
pub const BIN_FOLDER: &str = "bin_folder";

/// Subfolder of the output folder where pykilosort writes its results.
pub const OUTPUT_FOLDER: &str = "output";

const DESCRIPTION: &str = "pykilosort is a port of kilosort to python";

const INSTALLATION_HELP: &str = "
To use pykilosort:
  pip install cupy
  git clone https://github.com/MouseLand/pykilosort
  cd pykilosort && python setup.py install
More info at https://github.com/MouseLand/pykilosort#installation
";

/// The transient probe descriptor pykilosort's run entry point expects.
///
/// This is pykilosort's own lightweight channel-layout structure, not the
/// framework's probe model. One is built fresh per invocation from the
/// recording's channel locations and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KsProbe {
    /// Total channel count
    #[serde(rename = "NchanTOT")]
    pub nchan_tot: usize,
    /// Identity channel map `[0..n)`
    #[serde(rename = "chanMap")]
    pub chan_map: Vec<usize>,
    /// Shank/group label per channel; a single uniform group
    pub kcoords: Vec<f64>,
    /// X coordinate per channel (column 0 of the locations)
    pub xc: Vec<f64>,
    /// Y coordinate per channel (column 1 of the locations)
    pub yc: Vec<f64>,
}

impl KsProbe {
    /// Builds the descriptor from a recording's N x 2 channel locations.
    #[must_use]
    pub fn from_channel_locations(locations: &[[f64; 2]]) -> Self {
        let n = locations.len();
        Self {
            nchan_tot: n,
            chan_map: (0..n).collect(),
            kcoords: vec![1.0; n],
            xc: locations.iter().map(|loc| loc[0]).collect(),
            yc: locations.iter().map(|loc| loc[1]).collect(),
        }
    }
}

/// The pykilosort sorter adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct PyKilosortSorter;

impl Sorter for PyKilosortSorter {
    fn name(&self) -> &'static str {
        SORTER_NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn installation_help(&self) -> &'static str {
        INSTALLATION_HELP
    }

    fn requires_gpu(&self) -> bool {
        true
    }

    fn is_installed(&self) -> bool {
        runner::find_pykilosort().is_ok()
    }

    fn version(&self) -> Result<String> {
        runner::query_version()
    }

    fn default_params(&self) -> SorterParams {
        let mut params = SorterParams::new();
        params.insert("nfilt_factor", json!(8));
        params.insert("AUCsplit", json!(0.85));
        params.insert("nskip", json!(5));
        params.insert("low_memory", json!(false));
        params.insert("seed", json!(42));
        params.insert("preprocessing_function", json!("kilosort2"));
        params.insert("save_drift_spike_detections", json!(false));
        params.insert("perform_drift_registration", json!(false));
        params.insert("do_whitening", json!(true));
        params.insert("fs", json!(30000.0));
        params.insert("probe", json!(null));
        params.insert("n_channels", json!(385));
        params.insert("data_dtype", json!("int16"));
        params.insert("save_temp_files", json!(true));
        params.insert("fshigh", json!(300.0));
        params.insert("fslow", json!(null));
        params.insert("minfr_goodchannels", json!(0.1));
        params.insert("genericSpkTh", json!(8.0));
        params.insert("nblocks", json!(5));
        params.insert("output_filename", json!(null));
        params.insert("overwrite", json!(true));
        params.insert("sig_datashift", json!(20.0));
        params.insert("stable_mode", json!(true));
        params.insert("deterministic_mode", json!(true));
        params.insert("datashift", json!(null));
        params.insert("Th", json!([10, 4]));
        params.insert("ThPre", json!(8));
        params.insert("lam", json!(10));
        params.insert("minFR", json!(0.02));
        params.insert("momentum", json!([20, 400]));
        params.insert("sigmaMask", json!(30));
        params.insert("spkTh", json!(-6));
        params.insert("reorder", json!(1));
        params.insert("nSkipCov", json!(25));
        params.insert("ntbuff", json!(64));
        params.insert("whiteningRange", json!(32));
        params.insert("scaleproc", json!(200));
        params.insert("nPCs", json!(3));
        params.insert("nt0", json!(61));
        params.insert("nup", json!(10));
        params.insert("sig", json!(1));
        params.insert("gain", json!(1));
        params.insert("templateScaling", json!(20.0));
        params.insert("loc_range", json!([5, 4]));
        params.insert("long_range", json!([30, 6]));
        params
    }

    fn param_descriptions(&self) -> &'static [(&'static str, &'static str)] {
        PARAM_DESCRIPTIONS
    }

    fn check_params(
        &self,
        _recording: &dyn Recording,
        _output_folder: &Path,
        params: SorterParams,
    ) -> Result<SorterParams> {
        // Deliberate pass-through: pykilosort validates its own options
        Ok(params)
    }

    fn setup_recording(
        &self,
        recording: &dyn Recording,
        output_folder: &Path,
        _params: &SorterParams,
        verbose: bool,
    ) -> Result<()> {
        let bin_folder = output_folder.join(BIN_FOLDER);
        let staged = save_binary(recording, &bin_folder)?;
        if verbose {
            for path in staged.file_paths() {
                log::debug!("staged raw data file: {}", path.display());
            }
        }
        Ok(())
    }

    fn run_from_folder(
        &self,
        output_folder: &Path,
        params: &SorterParams,
        verbose: bool,
    ) -> Result<()> {
        // Round trip through the persisted description rather than reusing
        // any in-memory recording: the external tool only receives a file
        // path, and reloading guards against the description and the binary
        // diverging.
        let description_path = output_folder.join(BIN_FOLDER).join(RECORDING_DESCRIPTION_FILENAME);
        let recording = load_recording(&description_path)?;
        assert_eq!(
            recording.num_segments(),
            1,
            "multi-segment recordings are not supported by the pykilosort adapter"
        );

        let dat_path = &recording.file_paths()[0];
        if verbose {
            log::debug!("raw data file: {}", dat_path.display());
        }
        let probe = KsProbe::from_channel_locations(recording.channel_locations());

        let job = RunJob {
            dat_path,
            dir_path: output_folder,
            n_channels: recording.num_channels(),
            dtype: recording.dtype(),
            sample_rate: recording.sampling_frequency(),
            probe: &probe,
            params,
        };
        runner::invoke(&job, verbose)
    }

    fn result_from_folder(&self, output_folder: &Path) -> PhySortingReader {
        PhySortingReader::new(output_folder.join(OUTPUT_FOLDER))
    }
}

/// Human-readable description of every declared option.
const PARAM_DESCRIPTIONS: &[(&str, &str)] = &[
    ("nfilt_factor", "max number of clusters per good channel (even temporary ones)"),
    (
        "AUCsplit",
        "splitting a cluster at the end requires at least this much isolation for each sub-cluster (max=1)",
    ),
    ("nskip", "how many batches to skip for determining spike PCs"),
    ("low_memory", "low memory setting for running chronic recordings"),
    ("seed", "seed for deterministic output"),
    ("preprocessing_function", "pre-processing function used, 'kilosort2' or 'destriping'"),
    ("save_drift_spike_detections", "save detected spikes in drift correction"),
    ("perform_drift_registration", "estimate electrode drift and apply registration"),
    ("do_whitening", "whether or not to whiten data, if disabled channels are individually z-scored"),
    ("fs", "sample rate"),
    ("probe", "channel layout descriptor, built from the recording when not set"),
    ("n_channels", "number of channels in the data recording"),
    ("data_dtype", "data type of raw data"),
    ("save_temp_files", "keep temporary files created while running"),
    ("fshigh", "high pass filter frequency"),
    ("fslow", "low pass filter frequency"),
    ("minfr_goodchannels", "minimum firing rate on a 'good' channel (0 to skip)"),
    ("genericSpkTh", "threshold for crossings with generic templates"),
    (
        "nblocks",
        "number of blocks used to segment the probe when tracking drift, 0 == don't track, 1 == rigid, > 1 == non-rigid",
    ),
    ("output_filename", "optionally save registered data to a new binary file"),
    ("overwrite", "overwrite proc file with shifted data"),
    ("sig_datashift", "sigma for the Gaussian process smoothing"),
    ("stable_mode", "make output more stable"),
    ("deterministic_mode", "make output deterministic by sorting spikes before applying kernels"),
    ("datashift", "parameters for 'datashift' drift correction, not required"),
    ("Th", "threshold on projections (like in Kilosort1, can be different for last pass like [10 4])"),
    ("ThPre", "threshold crossings for pre-clustering (in PCA projection space)"),
    (
        "lam",
        "how important is the amplitude penalty (like in Kilosort1, 0 means not used, 10 is average, 50 is a lot)",
    ),
    ("minFR", "minimum spike rate (Hz), if a cluster falls below this for too long it gets removed"),
    ("momentum", "number of samples to average over (annealed from first to second value)"),
    ("sigmaMask", "spatial constant in um for computing residual variance of spike"),
    ("spkTh", "spike threshold in standard deviations"),
    ("reorder", "whether to reorder batches for drift correction"),
    ("nSkipCov", "compute whitening matrix from every nth batch"),
    ("ntbuff", "samples of symmetrical buffer for whitening and spike detection"),
    ("whiteningRange", "number of channels to use for whitening each channel"),
    ("scaleproc", "int16 scaling of whitened data"),
    ("nPCs", "how many PCs to project the spikes into"),
    ("nt0", "number of time samples for the templates"),
    ("nup", "upsampling factor for the templates"),
    ("sig", "spatial smoothness constant for registration"),
    ("gain", "scaling applied to the raw data"),
    ("templateScaling", "scaling applied to template projections"),
    ("loc_range", "spike localization window as [time samples, channels]"),
    ("long_range", "long-range drift estimation window as [time samples, channels]"),
];
