use codec::Key;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing or reading run files.
///
/// Every variant carries the path of the file involved so the pipeline can
/// report which run (or the merged stream) failed.
#[derive(Debug, Error)]
pub enum RunError {
    /// An underlying I/O error.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file length is not a whole number of keys.
    #[error("{}: length {len} is not a multiple of 4 bytes", .path.display())]
    Misaligned { path: PathBuf, len: u64 },

    /// The stream ended in the middle of a key.
    #[error("{}: truncated key at end of stream", .path.display())]
    TruncatedKey { path: PathBuf },

    /// A key smaller than its predecessor was pushed to a writer.
    #[error("{}: key {key:#010x} pushed after {previous:#010x}", .path.display())]
    OutOfOrder {
        path: PathBuf,
        previous: Key,
        key: Key,
    },

    /// A run with no keys was requested.
    #[error("refusing to write an empty run: {}", .path.display())]
    Empty { path: PathBuf },
}

impl RunError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        RunError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
