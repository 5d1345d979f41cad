//! Locating and invoking the external pykilosort tool.
//!
//! The tool is installed out-of-band (see the adapter's installation help)
//! and discovered on `PATH` at call time. Invocation is synchronous and
//! blocking: the job is serialized to a JSON file in the output folder, the
//! tool is spawned on it, and whatever failure it raises propagates to the
//! caller unmodified.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::dtype::SampleDtype;
use crate::errors::{Result, SpikesortError};
use crate::sorter::pykilosort::{KsProbe, SORTER_NAME};
use crate::sorter::SorterParams;

/// Name of the external executable.
const EXECUTABLE: &str = "pykilosort";

/// Locations tried when the executable is not on `PATH`.
const FALLBACK_PATHS: &[&str] =
    &["/usr/bin/pykilosort", "/usr/local/bin/pykilosort", "/opt/conda/bin/pykilosort"];

/// File name of the serialized job inside the output folder.
pub const JOB_FILENAME: &str = "pykilosort_job.json";

/// Everything the external run entry point receives for one invocation.
#[derive(Debug, Serialize)]
pub struct RunJob<'a> {
    /// The staged raw binary data file
    pub dat_path: &'a Path,
    /// The output folder the tool writes into
    pub dir_path: &'a Path,
    /// Channel count of the raw data
    pub n_channels: usize,
    /// Sample storage format of the raw data
    pub dtype: SampleDtype,
    /// Sampling frequency in Hz
    pub sample_rate: f64,
    /// Transient probe descriptor
    pub probe: &'a KsProbe,
    /// Full parameter mapping
    pub params: &'a SorterParams,
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

fn find_in_dirs(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|dir| dir.join(name)).find(|candidate| is_executable(candidate))
}

/// Locates the pykilosort executable.
///
/// `PATH` is re-scanned on every call so environment changes between calls
/// are observed; nothing is cached process-wide.
///
/// # Errors
/// Returns an error listing the searched locations if the executable is
/// nowhere to be found.
pub fn find_pykilosort() -> Result<PathBuf> {
    let path_dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    if let Some(found) = find_in_dirs(EXECUTABLE, &path_dirs) {
        return Ok(found);
    }
    for candidate in FALLBACK_PATHS {
        let path = Path::new(candidate);
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
    }
    Err(SpikesortError::ExecutableNotFound {
        name: EXECUTABLE.to_string(),
        searched: std::iter::once("PATH".to_string())
            .chain(FALLBACK_PATHS.iter().map(|p| (*p).to_string()))
            .collect(),
    })
}

/// Queries the external tool for its own version string.
///
/// # Errors
/// Returns an error if the tool is absent or the version query itself
/// fails; there is no placeholder fallback.
pub fn query_version() -> Result<String> {
    version_of(&find_pykilosort()?)
}

fn version_of(exe: &Path) -> Result<String> {
    let output =
        Command::new(exe).arg("--version").output().map_err(|e| SpikesortError::io(exe, e))?;
    if !output.status.success() {
        return Err(SpikesortError::SorterFailed {
            name: SORTER_NAME.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs the external tool on a serialized job, blocking until it exits.
///
/// # Errors
/// Returns an error if the tool cannot be found or spawned, or if it exits
/// with a failure status; the tool's stderr rides along in the error.
pub fn invoke(job: &RunJob<'_>, verbose: bool) -> Result<()> {
    let exe = find_pykilosort()?;

    let job_path = job.dir_path.join(JOB_FILENAME);
    let file = File::create(&job_path).map_err(|e| SpikesortError::io(&job_path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), job).map_err(|e| {
        SpikesortError::InvalidFileFormat {
            file_type: "job".to_string(),
            path: job_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut command = Command::new(&exe);
    command.arg("run").arg("--job").arg(&job_path);
    if verbose {
        command.arg("--verbose");
    }
    log::debug!("invoking {command:?}");

    let output = command.output().map_err(|e| SpikesortError::io(&exe, e))?;
    if !output.status.success() {
        return Err(SpikesortError::SorterFailed {
            name: SORTER_NAME.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if verbose {
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::info!("pykilosort: {line}");
        }
    }
    Ok(())
}
