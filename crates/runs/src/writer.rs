use byteorder::{LittleEndian, WriteBytesExt};
use codec::Key;
use std::fs::{rename, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::format::tmp_path;
use crate::RunError;

/// Capacity of the buffered writer behind every run file (1 MiB).
pub const WRITE_BUFFER_BYTES: usize = 1024 * 1024;

/// Streams ascending keys into a new run file.
///
/// Keys go to `<path>.tmp` through a [`BufWriter`]; [`finish`](RunWriter::finish)
/// flushes and renames the file to `path`. A writer dropped without
/// `finish` leaves only the `.tmp` file behind, which never looks like a
/// complete run.
///
/// Each pushed key is compared with the previous one, so a run on disk is
/// sorted by construction.
pub struct RunWriter {
    path: PathBuf,
    tmp_path: PathBuf,
    file: BufWriter<File>,
    len: u64,
    last: Option<Key>,
}

impl RunWriter {
    /// Creates (or truncates) `<path>.tmp` and returns a writer for it.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RunError> {
        let path = path.as_ref().to_path_buf();
        let tmp_path = tmp_path(&path);
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| RunError::io(&tmp_path, e))?;
        Ok(Self {
            path,
            tmp_path,
            file: BufWriter::with_capacity(WRITE_BUFFER_BYTES, raw_file),
            len: 0,
            last: None,
        })
    }

    /// Writes a whole sorted slice as one run and returns the key count.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Empty`] without touching the filesystem if `keys`
    /// is empty, [`RunError::OutOfOrder`] if the slice is not ascending, or
    /// any I/O failure.
    pub fn write_sorted<P: AsRef<Path>>(path: P, keys: &[Key]) -> Result<u64, RunError> {
        if keys.is_empty() {
            return Err(RunError::Empty {
                path: path.as_ref().to_path_buf(),
            });
        }
        let mut writer = Self::create(path)?;
        for &key in keys {
            writer.push(key)?;
        }
        writer.finish()
    }

    /// Appends one key.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::OutOfOrder`] if `key` is smaller than the last key
    /// pushed. Equal keys are allowed.
    pub fn push(&mut self, key: Key) -> Result<(), RunError> {
        if let Some(previous) = self.last {
            if key < previous {
                return Err(RunError::OutOfOrder {
                    path: self.path.clone(),
                    previous,
                    key,
                });
            }
        }
        self.file
            .write_u32::<LittleEndian>(key)
            .map_err(|e| RunError::io(&self.tmp_path, e))?;
        self.last = Some(key);
        self.len += 1;
        Ok(())
    }

    /// Number of keys pushed so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if nothing has been pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flushes buffered keys and publishes the file under its final name.
    ///
    /// An empty writer still produces an (empty) file: the merged stream of
    /// an empty input is a valid, zero-length stream.
    pub fn finish(self) -> Result<u64, RunError> {
        let Self {
            path,
            tmp_path,
            mut file,
            len,
            ..
        } = self;

        file.flush().map_err(|e| RunError::io(&tmp_path, e))?;
        drop(file.into_inner().map_err(|e| RunError::io(&tmp_path, e.into_error()))?);

        rename(&tmp_path, &path).map_err(|e| RunError::io(&path, e))?;
        Ok(len)
    }
}
