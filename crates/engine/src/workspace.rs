//! Temporary working directory for one counting pass.
//!
//! Holds the run files and the merged stream. The directory is a
//! [`tempfile::TempDir`], so it is removed when the `Workspace` is dropped,
//! early `?` returns included. With
//! `keep = true` the directory is released from the `TempDir` right away and
//! survives for inspection, even when the pass fails.

use anyhow::{Context, Result};
use runs::{run_file_name, MERGED_FILE_NAME, TMP_EXTENSION};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "uniq-ip-";

#[derive(Debug)]
enum Dir {
    Temp(TempDir),
    Kept(PathBuf),
}

#[derive(Debug)]
pub struct Workspace {
    dir: Dir,
}

impl Workspace {
    /// Creates a fresh workspace under `root` (the system temp dir when
    /// `None`). `root` is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` or the workspace directory cannot be
    /// created.
    pub fn create(root: Option<&Path>, keep: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("failed to create temp root {}", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("failed to create workspace directory")?;

        debug!(path = %dir.path().display(), keep, "created workspace");
        let dir = if keep { Dir::Kept(dir.keep()) } else { Dir::Temp(dir) };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Dir::Temp(dir) => dir.path(),
            Dir::Kept(path) => path,
        }
    }

    /// Location of run `index`.
    #[must_use]
    pub fn run_path(&self, index: usize) -> PathBuf {
        self.path().join(run_file_name(index))
    }

    /// Location of the merged stream.
    #[must_use]
    pub fn merged_path(&self) -> PathBuf {
        self.path().join(MERGED_FILE_NAME)
    }

    #[must_use]
    pub fn is_kept(&self) -> bool {
        matches!(self.dir, Dir::Kept(_))
    }

    /// Deletes a consumed file. Kept workspaces keep everything.
    pub fn discard(&self, path: &Path) -> Result<()> {
        if self.is_kept() {
            return Ok(());
        }
        std::fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))
    }

    /// Removes leftover `.tmp` files from writers that never finished.
    pub fn cleanup_tmp_files(&self) {
        if let Ok(entries) = std::fs::read_dir(self.path()) {
            for entry in entries.flatten() {
                let p = entry.path();
                if p.extension().map(|e| e == TMP_EXTENSION).unwrap_or(false) {
                    if let Err(e) = std::fs::remove_file(&p) {
                        warn!(path = %p.display(), error = %e, "failed to remove tmp file");
                    }
                }
            }
        }
    }

    /// Removes the workspace and reports any failure, or leaves it in place
    /// when it is kept. Returns the surviving path, if any.
    pub fn close(self) -> Result<Option<PathBuf>> {
        if self.is_kept() {
            self.cleanup_tmp_files();
        }
        match self.dir {
            Dir::Kept(path) => {
                debug!(path = %path.display(), "keeping workspace");
                Ok(Some(path))
            }
            Dir::Temp(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()
                    .with_context(|| format!("failed to remove workspace {}", path.display()))?;
                Ok(None)
            }
        }
    }
}
