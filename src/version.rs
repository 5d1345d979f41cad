#![allow(clippy::doc_markdown)] // Generated file contains OPT_LEVEL without backticks

use std::sync::LazyLock;

include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// Version of the software: the package version plus the git commit hash
/// and a dirty marker when the build tree had uncommitted changes. Falls
/// back to the bare package version when no git info is available.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    let mut version = match GIT_COMMIT_HASH {
        Some(hash) => format!("{PKG_VERSION}-{hash}"),
        None => PKG_VERSION.to_string(),
    };
    if GIT_DIRTY == Some(true) {
        version.push_str("-dirty");
    }
    version
});
