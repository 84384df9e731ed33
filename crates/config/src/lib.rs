//! # Config - settings for one counting pass
//!
//! [`CountConfig`] gathers everything the pipeline needs from its caller:
//! the input location, the memory budget for one run, where temporary files
//! go and how lines are parsed.
//!
//! ```text
//! chunk budget (bytes) / 4  =  buffer capacity C (keys per run)
//! ```
//!
//! The binary fills it from flags and environment variables; tests build it
//! directly and usually shrink the budget with
//! [`with_buffer_capacity`](CountConfig::with_buffer_capacity) to force many
//! small runs.

use codec::{ParsePolicy, KEY_BYTES};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default run budget in MiB.
pub const DEFAULT_CHUNK_MB: u64 = 1024;

const MIB: u64 = 1024 * 1024;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("input path must not be empty")]
    EmptyInput,

    #[error("chunk size must be greater than 0")]
    ZeroChunk,

    #[error("chunk size of {0} bytes holds no key (minimum 4 bytes)")]
    ChunkTooSmall(u64),

    #[error("chunk size of {0} MiB overflows")]
    ChunkOverflow(u64),

    #[error("chunk size of {0} bytes does not fit in memory on this platform")]
    ChunkTooLarge(u64),
}

/// Settings for one counting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountConfig {
    /// File holding one address per line.
    pub input: PathBuf,
    /// Memory budget for one run, in bytes.
    pub chunk_bytes: u64,
    /// Parent of the temporary workspace; the system temp dir when `None`.
    pub temp_root: Option<PathBuf>,
    /// How structurally plausible lines are parsed.
    pub policy: ParsePolicy,
    /// Leave run files on disk after the pass.
    pub keep_workspace: bool,
}

impl CountConfig {
    /// Creates a config for `input` with default settings.
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            chunk_bytes: DEFAULT_CHUNK_MB * MIB,
            temp_root: None,
            policy: ParsePolicy::default(),
            keep_workspace: false,
        }
    }

    /// Sets the run budget in MiB.
    ///
    /// # Errors
    ///
    /// Returns an error if `mb` is zero or the byte count overflows `u64`.
    pub fn with_chunk_mb(mut self, mb: u64) -> Result<Self, ConfigError> {
        if mb == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        self.chunk_bytes = mb.checked_mul(MIB).ok_or(ConfigError::ChunkOverflow(mb))?;
        Ok(self)
    }

    /// Sets the run budget in bytes. Validated by [`validate`](Self::validate).
    #[must_use]
    pub fn with_chunk_bytes(mut self, bytes: u64) -> Self {
        self.chunk_bytes = bytes;
        self
    }

    /// Sets the run budget so each run holds exactly `keys` keys.
    #[must_use]
    pub fn with_buffer_capacity(mut self, keys: usize) -> Self {
        self.chunk_bytes = (keys as u64).saturating_mul(KEY_BYTES as u64);
        self
    }

    #[must_use]
    pub fn with_temp_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.temp_root = Some(root.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    /// Keys held in memory before a run is flushed (`chunk_bytes / 4`).
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        usize::try_from(self.chunk_bytes / KEY_BYTES as u64).unwrap_or(usize::MAX)
    }

    /// Checks the settings before any file is touched.
    ///
    /// # Errors
    ///
    /// Rejects an empty input path, a zero budget, a budget smaller than one
    /// key, and a budget larger than the address space.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::EmptyInput);
        }
        if self.chunk_bytes == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        if self.chunk_bytes < KEY_BYTES as u64 {
            return Err(ConfigError::ChunkTooSmall(self.chunk_bytes));
        }
        if usize::try_from(self.chunk_bytes).is_err() {
            return Err(ConfigError::ChunkTooLarge(self.chunk_bytes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CountConfig::new("ips.txt");
        assert_eq!(cfg.chunk_bytes, 1024 * 1024 * 1024);
        assert_eq!(cfg.buffer_capacity(), 256 * 1024 * 1024);
        assert_eq!(cfg.policy, ParsePolicy::Permissive);
        assert!(cfg.temp_root.is_none());
        assert!(!cfg.keep_workspace);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn chunk_mb_converts_to_capacity() {
        let cfg = CountConfig::new("ips.txt").with_chunk_mb(1).unwrap();
        assert_eq!(cfg.chunk_bytes, 1024 * 1024);
        assert_eq!(cfg.buffer_capacity(), 262_144);
    }

    #[test]
    fn zero_chunk_is_rejected() {
        assert_eq!(
            CountConfig::new("ips.txt").with_chunk_mb(0).unwrap_err(),
            ConfigError::ZeroChunk
        );
        let cfg = CountConfig::new("ips.txt").with_chunk_bytes(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroChunk));
    }

    #[test]
    fn overflowing_chunk_is_rejected() {
        assert_eq!(
            CountConfig::new("ips.txt").with_chunk_mb(u64::MAX).unwrap_err(),
            ConfigError::ChunkOverflow(u64::MAX)
        );
    }

    #[test]
    fn budget_must_hold_one_key() {
        let cfg = CountConfig::new("ips.txt").with_chunk_bytes(3);
        assert_eq!(cfg.validate(), Err(ConfigError::ChunkTooSmall(3)));
        let cfg = CountConfig::new("ips.txt").with_chunk_bytes(4);
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.buffer_capacity(), 1);
    }

    #[test]
    fn partial_keys_round_down() {
        let cfg = CountConfig::new("ips.txt").with_chunk_bytes(11);
        assert_eq!(cfg.buffer_capacity(), 2);
    }

    #[test]
    fn buffer_capacity_override() {
        let cfg = CountConfig::new("ips.txt").with_buffer_capacity(3);
        assert_eq!(cfg.chunk_bytes, 12);
        assert_eq!(cfg.buffer_capacity(), 3);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(CountConfig::new("").validate(), Err(ConfigError::EmptyInput));
    }

    #[test]
    fn builder_sets_every_field() {
        let cfg = CountConfig::new("in.txt")
            .with_temp_root("/var/tmp")
            .with_policy(ParsePolicy::Strict)
            .keep_workspace(true);
        assert_eq!(cfg.temp_root.as_deref(), Some(Path::new("/var/tmp")));
        assert_eq!(cfg.policy, ParsePolicy::Strict);
        assert!(cfg.keep_workspace);
    }

    #[test]
    fn errors_render_readably() {
        assert_eq!(
            ConfigError::ChunkTooSmall(2).to_string(),
            "chunk size of 2 bytes holds no key (minimum 4 bytes)"
        );
    }
}
