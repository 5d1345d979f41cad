//! Phy-format output fixtures, as a kilosort-family sorter would write them.

use std::path::Path;

use fgoxide::io::DelimFile;
use spikesort_lib::sorting::ClusterGroup;

/// Writes a 1-D NPY v1 file with the given descr and raw data.
fn write_npy(path: &Path, descr: &str, count: usize, data: &[u8]) {
    let mut header =
        format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': ({count},), }}");
    let unpadded = 10 + header.len() + 1;
    header.push_str(&" ".repeat(unpadded.div_ceil(64) * 64 - unpadded));
    header.push('\n');

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"\x93NUMPY\x01\x00");
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(data);
    std::fs::write(path, bytes).expect("write npy fixture");
}

/// Writes `spike_times.npy` as uint64 sample indices.
pub fn write_spike_times(folder: &Path, times: &[u64]) {
    let data: Vec<u8> = times.iter().flat_map(|t| t.to_le_bytes()).collect();
    write_npy(&folder.join("spike_times.npy"), "<u8", times.len(), &data);
}

/// Writes `spike_clusters.npy` as int32 unit assignments.
pub fn write_spike_clusters(folder: &Path, clusters: &[i32]) {
    let data: Vec<u8> = clusters.iter().flat_map(|c| c.to_le_bytes()).collect();
    write_npy(&folder.join("spike_clusters.npy"), "<i4", clusters.len(), &data);
}

/// Writes `cluster_group.tsv` with the given curation labels.
pub fn write_cluster_groups(folder: &Path, groups: &[(i64, &str)]) {
    let records: Vec<ClusterGroup> = groups
        .iter()
        .map(|(cluster_id, group)| ClusterGroup {
            cluster_id: *cluster_id,
            group: (*group).to_string(),
        })
        .collect();
    DelimFile::default().write_tsv(&folder.join("cluster_group.tsv"), &records).expect("write tsv");
}

/// Creates a complete phy-format output folder.
pub fn create_phy_output(folder: &Path, times: &[u64], clusters: &[i32]) {
    std::fs::create_dir_all(folder).expect("create output folder");
    write_spike_times(folder, times);
    write_spike_clusters(folder, clusters);
    let unit_ids: std::collections::BTreeSet<i64> =
        clusters.iter().map(|c| i64::from(*c)).collect();
    let groups: Vec<(i64, &str)> = unit_ids.iter().map(|id| (*id, "good")).collect();
    write_cluster_groups(folder, &groups);
}
