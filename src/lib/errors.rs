//! Custom error types for spikesort operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spikesort operations
pub type Result<T> = std::result::Result<T, SpikesortError>;

/// Error type for spikesort operations
#[derive(Error, Debug)]
pub enum SpikesortError {
    /// No sorter is registered under the requested name
    #[error("Unknown sorter '{name}'")]
    UnknownSorter {
        /// The requested sorter name
        name: String,
    },

    /// The external sorter is not installed on this machine
    #[error("Sorter '{name}' is not installed.{help}")]
    SorterNotInstalled {
        /// The sorter name
        name: String,
        /// Installation instructions for the external tool
        help: String,
    },

    /// The external sorter executable could not be located
    #[error("'{name}' executable not found; searched: {}", .searched.join(", "))]
    ExecutableNotFound {
        /// The executable name
        name: String,
        /// Locations that were searched
        searched: Vec<String>,
    },

    /// The external sorter ran but exited with a failure status
    #[error("Sorter '{name}' exited with status {code:?}: {stderr}")]
    SorterFailed {
        /// The sorter name
        name: String,
        /// Process exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error output
        stderr: String,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "NPY", "recording description")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Unknown sample dtype string
    #[error("Unknown sample dtype '{name}'")]
    UnknownDtype {
        /// The unrecognized dtype name
        name: String,
    },

    /// A recording that this operation cannot handle
    #[error("Unsupported recording: {reason}")]
    UnsupportedRecording {
        /// Explanation of the problem
        reason: String,
    },

    /// I/O failure with the path it occurred on
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path the operation failed on
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl SpikesortError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
