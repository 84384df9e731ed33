//! Run file naming and the handle describing a persisted run.
//!
//! ```text
//! <workspace>/run-000000.bin
//! <workspace>/run-000001.bin
//! ...
//! <workspace>/merged.bin
//! ```
//!
//! Files are first written as `<name>.tmp` and renamed once complete, so a
//! name ending in `.bin` always refers to a fully written file.

use std::path::{Path, PathBuf};

/// Extension of published run files.
pub const RUN_EXTENSION: &str = "bin";

/// Extension of files still being written.
pub const TMP_EXTENSION: &str = "tmp";

/// File name of the merged stream inside a workspace.
pub const MERGED_FILE_NAME: &str = "merged.bin";

/// File name of run `index`, zero-padded so lexical order is creation order.
#[must_use]
pub fn run_file_name(index: usize) -> String {
    format!("run-{:06}.{}", index, RUN_EXTENSION)
}

/// A persisted, sorted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    /// Ordinal of the run in creation order.
    pub index: usize,
    /// Location of the run file.
    pub path: PathBuf,
    /// Number of keys in the run.
    pub len: u64,
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(TMP_EXTENSION);
    PathBuf::from(name)
}
