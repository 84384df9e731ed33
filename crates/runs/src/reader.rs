use byteorder::{ByteOrder, LittleEndian};
use codec::{Key, KEY_BYTES};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::RunError;

/// Capacity of the buffered reader behind every open run (64 KiB).
///
/// The merge keeps one reader per run open, so this bounds the per-run
/// memory cost during merging.
pub const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Sequential reader over a run file or the merged stream.
///
/// Generic over any `Read` implementor so tests can feed in-memory buffers
/// (`Cursor<Vec<u8>>`) the same way the pipeline feeds files.
///
/// # Termination
///
/// - **Clean EOF** on a key boundary -> `Ok(None)`.
/// - **EOF inside a key** -> [`RunError::TruncatedKey`].
/// - **I/O error** -> [`RunError::Io`].
pub struct RunReader<R: Read = File> {
    /// Path of the underlying file, kept for error reporting.
    path: PathBuf,
    rdr: BufReader<R>,
    /// Total key count when known up front (files opened from disk).
    len: Option<u64>,
    read: u64,
}

impl RunReader<File> {
    /// Opens a run file for sequential reading.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Misaligned`] if the file length is not a multiple
    /// of [`KEY_BYTES`], or [`RunError::Io`] if it cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RunError> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path).map_err(|e| RunError::io(&path, e))?;
        let filesize = f.metadata().map_err(|e| RunError::io(&path, e))?.len();

        if filesize % KEY_BYTES as u64 != 0 {
            return Err(RunError::Misaligned {
                path,
                len: filesize,
            });
        }

        Ok(Self {
            path,
            rdr: BufReader::with_capacity(READ_BUFFER_BYTES, f),
            len: Some(filesize / KEY_BYTES as u64),
            read: 0,
        })
    }
}

impl<R: Read> RunReader<R> {
    /// Wraps any reader. `label` is only used in error messages.
    pub fn from_reader<P: AsRef<Path>>(label: P, reader: R) -> Self {
        Self {
            path: label.as_ref().to_path_buf(),
            rdr: BufReader::with_capacity(READ_BUFFER_BYTES, reader),
            len: None,
            read: 0,
        }
    }

    /// Reads the next key, or `Ok(None)` at a clean end of stream.
    pub fn next_key(&mut self) -> Result<Option<Key>, RunError> {
        let mut buf = [0u8; KEY_BYTES];
        let mut filled = 0;
        while filled < KEY_BYTES {
            match self.rdr.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RunError::io(&self.path, e)),
            }
        }

        match filled {
            0 => Ok(None),
            KEY_BYTES => {
                self.read += 1;
                Ok(Some(LittleEndian::read_u32(&buf)))
            }
            _ => Err(RunError::TruncatedKey {
                path: self.path.clone(),
            }),
        }
    }

    /// Reads every remaining key into a `Vec`.
    ///
    /// Only meant for tests and small streams: the whole run ends up in
    /// memory.
    pub fn read_all(&mut self) -> Result<Vec<Key>, RunError> {
        let mut keys = Vec::new();
        while let Some(key) = self.next_key()? {
            keys.push(key);
        }
        Ok(keys)
    }

    /// Total number of keys in the file, if known.
    #[must_use]
    pub fn len(&self) -> Option<u64> {
        self.len
    }

    /// Number of keys returned so far.
    #[must_use]
    pub fn keys_read(&self) -> u64 {
        self.read
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Read> Iterator for RunReader<R> {
    type Item = Result<Key, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}
