//! Reading spike-sorting results from a phy-format output folder.
//!
//! Kilosort-family sorters leave their results as a directory of flat files
//! (the layout the phy curation tool consumes): `spike_times.npy` with one
//! sample index per detected spike, `spike_clusters.npy` with the matching
//! unit assignment, and `cluster_group.tsv` with curation labels.
//!
//! [`PhySortingReader`] is a handle over such a directory. Constructing one
//! never touches the filesystem; a missing or malformed directory surfaces
//! from the accessors when the reader is exercised.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SpikesortError};
use crate::npy;

const SPIKE_TIMES_FILE: &str = "spike_times.npy";
const SPIKE_CLUSTERS_FILE: &str = "spike_clusters.npy";
const CLUSTER_GROUP_FILE: &str = "cluster_group.tsv";

/// Curation label for one unit, from `cluster_group.tsv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
    /// Unit id as assigned by the sorter
    pub cluster_id: i64,
    /// Curation label ("good", "mua", "noise", ...)
    pub group: String,
}

/// A reader over a phy-format sorting output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhySortingReader {
    folder: PathBuf,
}

impl PhySortingReader {
    /// Creates a reader pointed at `folder`.
    ///
    /// The folder is not required to exist yet; every accessor re-reads the
    /// files it needs and reports problems at that point.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self { folder: folder.into() }
    }

    /// The output directory this reader points at.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Spike times as sample indices, in file order.
    ///
    /// # Errors
    /// Returns an error if `spike_times.npy` is missing, malformed, or
    /// contains a negative time.
    pub fn spike_times(&self) -> Result<Vec<u64>> {
        let path = self.folder.join(SPIKE_TIMES_FILE);
        npy::read_1d_integers(&path)?
            .into_iter()
            .map(|t| {
                u64::try_from(t).map_err(|_| SpikesortError::InvalidFileFormat {
                    file_type: "NPY".to_string(),
                    path: path.display().to_string(),
                    reason: format!("negative spike time {t}"),
                })
            })
            .collect()
    }

    /// Unit assignment for each spike, parallel to [`spike_times`](Self::spike_times).
    ///
    /// # Errors
    /// Returns an error if `spike_clusters.npy` is missing or malformed.
    pub fn spike_clusters(&self) -> Result<Vec<i64>> {
        npy::read_1d_integers(&self.folder.join(SPIKE_CLUSTERS_FILE))
    }

    /// Sorted unique unit ids.
    ///
    /// # Errors
    /// Returns an error if the cluster assignments cannot be read.
    pub fn unit_ids(&self) -> Result<Vec<i64>> {
        let mut ids = self.spike_clusters()?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Spike times grouped per unit, each train in ascending file order.
    ///
    /// # Errors
    /// Returns an error if either file cannot be read or their lengths
    /// disagree.
    pub fn spike_trains(&self) -> Result<BTreeMap<i64, Vec<u64>>> {
        let times = self.spike_times()?;
        let clusters = self.spike_clusters()?;
        if times.len() != clusters.len() {
            return Err(SpikesortError::InvalidFileFormat {
                file_type: "sorting output".to_string(),
                path: self.folder.display().to_string(),
                reason: format!(
                    "{} spike times but {} cluster assignments",
                    times.len(),
                    clusters.len()
                ),
            });
        }
        let mut trains: BTreeMap<i64, Vec<u64>> = BTreeMap::new();
        for (time, cluster) in times.into_iter().zip(clusters) {
            trains.entry(cluster).or_default().push(time);
        }
        Ok(trains)
    }

    /// Curation labels from `cluster_group.tsv`.
    ///
    /// # Errors
    /// Returns an error if the file is missing or not parseable TSV.
    pub fn cluster_groups(&self) -> Result<Vec<ClusterGroup>> {
        let path = self.folder.join(CLUSTER_GROUP_FILE);
        DelimFile::default().read_tsv(&path).map_err(|e| SpikesortError::InvalidFileFormat {
            file_type: "cluster group".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
