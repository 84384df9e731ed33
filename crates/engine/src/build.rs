//! Build stage: input lines -> keys -> sorted runs on disk.
//!
//! Lines are encoded one at a time and appended to a bounded key buffer.
//! When the buffer holds `capacity` keys it is sorted and flushed as a new
//! run; a partially filled buffer is flushed the same way at end of input.

use anyhow::{Context, Result};
use codec::{decode, encode, Key, ParsePolicy, MAX_LINE_LEN};
use runs::{RunHandle, RunWriter};
use std::io::{self, BufRead};
use tracing::{debug, info};

use crate::Workspace;

/// Reader capacity for the input file (1 MiB).
pub const INPUT_BUFFER_BYTES: usize = 1024 * 1024;

/// Accepted lines between two progress events.
pub const PROGRESS_EVERY: u64 = 100_000;

/// Bytes of a line kept by [`build_runs`]: the longest accepted address, a
/// trailing `\r`, and one more byte so an overlong line stays overlong.
pub const LINE_LIMIT: usize = MAX_LINE_LEN + 2;

/// Keys reserved up front; the buffer grows towards its capacity from here.
const INITIAL_BUFFER_KEYS: usize = 1 << 20;

/// Counters collected while reading the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Every line seen, valid or not.
    pub lines_read: u64,
    /// Lines the encoder turned down.
    pub lines_rejected: u64,
    /// Keys handed to the run builder.
    pub keys_accepted: u64,
    /// Input bytes consumed, newlines included.
    pub bytes_read: u64,
}

/// Accumulates keys and persists them as sorted runs.
pub struct RunBuilder<'a> {
    workspace: &'a Workspace,
    capacity: usize,
    buffer: Vec<Key>,
    runs: Vec<RunHandle>,
}

impl<'a> RunBuilder<'a> {
    /// Creates a builder that flushes every `capacity` keys.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero.
    pub fn new(workspace: &'a Workspace, capacity: usize) -> Result<Self> {
        anyhow::ensure!(capacity > 0, "run buffer capacity must be greater than 0");
        Ok(Self {
            workspace,
            capacity,
            buffer: Vec::with_capacity(capacity.min(INITIAL_BUFFER_KEYS)),
            runs: Vec::new(),
        })
    }

    /// Appends one key, flushing a run when the buffer becomes full.
    pub fn push(&mut self, key: Key) -> Result<()> {
        if self.buffer.len() == self.buffer.capacity() {
            // grow geometrically, but never past the configured capacity
            let len = self.buffer.len();
            self.buffer.reserve_exact(len.max(1).min(self.capacity - len));
        }
        self.buffer.push(key);

        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Flushes any buffered keys and returns the runs in creation order.
    pub fn finish(mut self) -> Result<Vec<RunHandle>> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.runs)
    }

    /// Number of runs written so far.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Keys waiting in the buffer.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Sorts the buffer, writes it as the next run and clears it for reuse.
    fn flush(&mut self) -> Result<()> {
        let index = self.runs.len();
        let path = self.workspace.run_path(index);

        self.buffer.sort_unstable();
        let len = RunWriter::write_sorted(&path, &self.buffer)
            .with_context(|| format!("failed to write run {}", index))?;
        debug!(
            run = index,
            keys = len,
            first = %decode(self.buffer[0]),
            last = %decode(self.buffer[self.buffer.len() - 1]),
            path = %path.display(),
            "flushed run"
        );

        self.runs.push(RunHandle { index, path, len });
        self.buffer.clear();
        Ok(())
    }
}

/// Line reader that never buffers more than `limit` bytes of a line.
///
/// Overlong lines are truncated to `limit` bytes while the rest of the line
/// is skipped; with [`LINE_LIMIT`] the truncated line is still too long for
/// the encoder. A file with no newlines therefore cannot exhaust memory.
pub struct LineReader<R: BufRead> {
    rdr: R,
    line: Vec<u8>,
    limit: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(rdr: R, limit: usize) -> Self {
        Self {
            rdr,
            line: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Returns the next line without its `\n` and the number of input bytes
    /// it consumed, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<(&[u8], usize)>> {
        self.line.clear();
        let mut consumed = 0usize;
        loop {
            let (done, used) = {
                let available = match self.rdr.fill_buf() {
                    Ok(b) => b,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    break;
                }
                let (chunk, done, used) = match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (&available[..i], true, i + 1),
                    None => (available, false, available.len()),
                };
                let room = self.limit.saturating_sub(self.line.len());
                self.line.extend_from_slice(&chunk[..chunk.len().min(room)]);
                (done, used)
            };
            self.rdr.consume(used);
            consumed += used;
            if done {
                break;
            }
        }

        if consumed == 0 {
            return Ok(None);
        }
        Ok(Some((self.line.as_slice(), consumed)))
    }
}

/// Reads `input` to the end and writes its keys as sorted runs.
///
/// `size_hint` is the input size in bytes, used only for progress events.
///
/// # Errors
///
/// Any read failure on the input or write failure on a run aborts the stage.
pub fn build_runs<R: BufRead>(
    input: R,
    workspace: &Workspace,
    capacity: usize,
    policy: ParsePolicy,
    size_hint: Option<u64>,
) -> Result<(Vec<RunHandle>, BuildStats)> {
    let mut builder = RunBuilder::new(workspace, capacity)?;
    let mut lines = LineReader::new(input, LINE_LIMIT);
    let mut stats = BuildStats::default();

    while let Some((line, consumed)) = lines.next_line().context("failed to read input")? {
        stats.lines_read += 1;
        stats.bytes_read += consumed as u64;

        let key = match encode(line, policy) {
            Some(k) => k,
            None => {
                stats.lines_rejected += 1;
                continue;
            }
        };
        builder.push(key)?;
        stats.keys_accepted += 1;

        if stats.keys_accepted % PROGRESS_EVERY == 0 {
            report_progress(&stats, size_hint, builder.run_count());
        }
    }

    let runs = builder.finish()?;
    info!(
        runs = runs.len(),
        keys = stats.keys_accepted,
        rejected = stats.lines_rejected,
        "input split into sorted runs"
    );
    Ok((runs, stats))
}

fn report_progress(stats: &BuildStats, size_hint: Option<u64>, runs: usize) {
    match size_hint {
        Some(total) if total > 0 => {
            let percent = (stats.bytes_read as f64 * 10_000.0 / total as f64).round() / 100.0;
            info!(
                percent,
                keys = stats.keys_accepted,
                runs,
                "reading input"
            );
        }
        _ => info!(keys = stats.keys_accepted, runs, "reading input"),
    }
}
