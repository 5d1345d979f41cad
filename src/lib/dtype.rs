//! Sample storage formats for raw recordings.
//!
//! Recordings carry their on-disk sample format as a [`SampleDtype`]. The
//! canonical string form ("int16", "float32", ...) matches the numpy dtype
//! names used by serialized recording descriptions and by the external
//! sorter's job contract.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{Result, SpikesortError};

/// Sample storage format of a recording's raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleDtype {
    /// Signed 16-bit integer samples, the common format for raw acquisition
    Int16,
    /// Unsigned 16-bit integer samples
    Uint16,
    /// Signed 32-bit integer samples
    Int32,
    /// 32-bit floating point samples
    Float32,
    /// 64-bit floating point samples
    Float64,
}

impl SampleDtype {
    /// All supported dtypes, in canonical order.
    pub const ALL: [SampleDtype; 5] =
        [Self::Int16, Self::Uint16, Self::Int32, Self::Float32, Self::Float64];

    /// Width of one sample in bytes.
    #[must_use]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Canonical numpy-style name ("int16", "float32", ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for SampleDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleDtype {
    type Err = SpikesortError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int16" => Ok(Self::Int16),
            "uint16" => Ok(Self::Uint16),
            "int32" => Ok(Self::Int32),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            other => Err(SpikesortError::UnknownDtype { name: other.to_string() }),
        }
    }
}

impl Serialize for SampleDtype {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SampleDtype {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(D::Error::custom)
    }
}
