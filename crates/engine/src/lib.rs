//! # Engine - external sort/merge/dedup pipeline
//!
//! Ties the [`codec`], [`runs`] and [`config`] crates together into the
//! counting pipeline.
//!
//! ## Architecture
//!
//! ```text
//! input file
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                  PIPELINE                     │
//! │                                               │
//! │ build.rs → encode line → key buffer           │
//! │              |                                │
//! │              |  (buffer holds C keys?)        │
//! │              |            yes                 │
//! │              v                                │
//! │           sort + flush → run-NNNNNN.bin       │
//! │                                               │
//! │ merge.rs → k-way merge of all runs            │
//! │              → merged.bin                     │
//! │                                               │
//! │ count.rs → one pass, count value changes      │
//! └───────────────────────────────────────────────┘
//!   |
//!   v
//! unique count
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module          | Purpose                                              |
//! |-----------------|------------------------------------------------------|
//! | [`lib.rs`]      | `Pipeline`, `PipelineReport`, stage sequencing       |
//! | [`workspace`]   | Temporary directory holding runs and merged stream   |
//! | [`build`]       | Line reading, `RunBuilder`, run flushes              |
//! | [`merge`]       | Streaming merge of runs into the merged stream       |
//! | [`count`]       | Distinct-adjacent counting                           |
//!
//! ## Failure
//!
//! Every I/O failure aborts the pass with the stage and file named in the
//! error chain. No count is returned from a failed pass, and the workspace
//! is removed on the way out unless it was asked to be kept.
mod build;
mod count;
mod merge;
mod workspace;

use anyhow::{Context, Result};
use config::CountConfig;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

pub use build::{build_runs, BuildStats, LineReader, RunBuilder, INPUT_BUFFER_BYTES, LINE_LIMIT, PROGRESS_EVERY};
pub use count::{count_distinct, count_merged};
pub use merge::merge_runs;
pub use workspace::{Workspace, WORKSPACE_PREFIX};

/// Outcome of one counting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Distinct keys in the input.
    pub unique: u64,
    /// Every line seen, valid or not.
    pub lines_read: u64,
    /// Lines excluded by the encoder.
    pub lines_rejected: u64,
    /// Keys that entered the sort. Rejected lines are not included.
    pub keys_accepted: u64,
    /// Sorted runs written by the build stage.
    pub runs_created: usize,
    /// Keys in the merged stream; always equal to `keys_accepted`.
    pub merged_len: u64,
    /// Input bytes consumed.
    pub bytes_read: u64,
    /// Wall time of the pass.
    pub elapsed: Duration,
    /// Workspace left on disk when it was asked to be kept.
    pub workspace: Option<PathBuf>,
}

/// The counting pipeline for one configuration.
///
/// # Stages
///
/// 1. Read the input line by line, encode, and write sorted runs of at most
///    `buffer_capacity()` keys.
/// 2. Merge every run into a single ascending merged stream.
/// 3. Count value changes in the merged stream.
///
/// Stages run strictly one after another; each stage owns its buffers and
/// releases them before the next starts.
pub struct Pipeline {
    config: CountConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("input", &self.config.input)
            .field("chunk_bytes", &self.config.chunk_bytes)
            .field("buffer_capacity", &self.config.buffer_capacity())
            .field("temp_root", &self.config.temp_root)
            .field("policy", &self.config.policy)
            .field("keep_workspace", &self.config.keep_workspace)
            .finish()
    }
}

impl Pipeline {
    /// Validates `config` and returns a pipeline for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected by
    /// [`CountConfig::validate`].
    pub fn new(config: CountConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    /// Counts distinct addresses in the configured input file.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or stat'd, or if any
    /// stage fails.
    pub fn run(&self) -> Result<PipelineReport> {
        let input = &self.config.input;
        let file = File::open(input)
            .with_context(|| format!("failed to open input {}", input.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("failed to stat input {}", input.display()))?
            .len();

        info!(input = %input.display(), bytes = size, "counting unique addresses");
        self.run_reader(BufReader::with_capacity(INPUT_BUFFER_BYTES, file), Some(size))
    }

    /// Counts distinct addresses read from `input`.
    ///
    /// `size_hint` is only used for progress events.
    pub fn run_reader<R: BufRead>(&self, input: R, size_hint: Option<u64>) -> Result<PipelineReport> {
        let start = Instant::now();
        let workspace = Workspace::create(self.config.temp_root.as_deref(), self.config.keep_workspace)?;

        let (runs, stats) = build_runs(
            input,
            &workspace,
            self.config.buffer_capacity(),
            self.config.policy,
            size_hint,
        )
        .context("build stage failed")?;

        let merged_path = workspace.merged_path();
        let merged_len = merge_runs(&runs, &merged_path).context("merge stage failed")?;
        anyhow::ensure!(
            merged_len == stats.keys_accepted,
            "merged stream holds {} keys but {} were accepted",
            merged_len,
            stats.keys_accepted
        );

        // runs are consumed exactly once
        for run in &runs {
            workspace.discard(&run.path)?;
        }

        let unique = count_merged(&merged_path).context("count stage failed")?;
        workspace.discard(&merged_path)?;
        let kept = workspace.close()?;

        let report = PipelineReport {
            unique,
            lines_read: stats.lines_read,
            lines_rejected: stats.lines_rejected,
            keys_accepted: stats.keys_accepted,
            runs_created: runs.len(),
            merged_len,
            bytes_read: stats.bytes_read,
            elapsed: start.elapsed(),
            workspace: kept,
        };
        info!(
            unique = report.unique,
            keys = report.keys_accepted,
            runs = report.runs_created,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "count complete"
        );
        Ok(report)
    }
}

/// Counts distinct addresses in `config.input`; shorthand for
/// `Pipeline::new(config)?.run()?.unique`.
pub fn count_unique(config: CountConfig) -> Result<u64> {
    Ok(Pipeline::new(config)?.run()?.unique)
}

#[cfg(test)]
mod tests;
