//! Count stage: one sequential pass over the merged stream.
//!
//! The stream is sorted, so equal keys are adjacent and the number of
//! distinct keys is the number of positions where the value changes (plus
//! the first element). No ordering check is made here: the merged stream
//! was already verified ascending by the writer that produced it.

use anyhow::{Context, Result};
use runs::{RunReader, SortedSource};
use std::path::Path;
use tracing::info;

/// Counts distinct keys in an ascending source.
///
/// # Errors
///
/// Propagates the first error the source reports. Clean exhaustion is the
/// normal end of the pass.
pub fn count_distinct<S: SortedSource>(source: &mut S) -> Result<u64, S::Error> {
    let mut unique = 0u64;
    let mut previous: Option<S::Key> = None;

    while let Some(current) = source.next_key()? {
        if previous != Some(current) {
            unique += 1;
            previous = Some(current);
        }
    }
    Ok(unique)
}

/// Counts distinct keys in the merged stream file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not a whole number of
/// keys, or fails mid-read.
pub fn count_merged(path: &Path) -> Result<u64> {
    let mut reader = RunReader::open(path).context("failed to open merged stream")?;
    let unique = count_distinct(&mut reader).context("failed to read merged stream")?;
    info!(unique, keys = reader.keys_read(), "merged stream counted");
    Ok(unique)
}
