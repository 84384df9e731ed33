//! Merge stage: all runs -> one sorted merged stream on disk.
//!
//! Streams every run through a [`MergeIterator`] straight into a
//! [`RunWriter`], so memory use is one buffered reader per run plus the
//! heap, never the data itself.

use anyhow::{Context, Result};
use runs::{MergeIterator, RunHandle, RunReader, RunWriter};
use std::path::Path;
use tracing::info;

/// Merges `runs` into a new file at `out` and returns the number of keys
/// written.
///
/// Every run reader is owned by the merge and closed when this function
/// returns, whether it succeeds or fails.
///
/// # Errors
///
/// Returns an error if any run cannot be opened or read, or if the merged
/// stream cannot be written.
pub fn merge_runs(runs: &[RunHandle], out: &Path) -> Result<u64> {
    let mut readers = Vec::with_capacity(runs.len());
    for run in runs {
        let reader = RunReader::open(&run.path)
            .with_context(|| format!("failed to open run {}", run.index))?;
        readers.push(reader);
    }

    let mut merge = MergeIterator::new(readers).context("failed to read the first key of a run")?;
    let mut writer = RunWriter::create(out).context("failed to create merged stream")?;

    while let Some(key) = merge.next_key().context("failed to read run during merge")? {
        writer.push(key).context("failed to write merged stream")?;
    }
    // release every run handle before publishing the output
    drop(merge);

    let written = writer.finish().context("failed to finish merged stream")?;
    info!(runs = runs.len(), keys = written, path = %out.display(), "runs merged");
    Ok(written)
}
