//! # Runs - sorted key files and the k-way merge
//!
//! Immutable on-disk sequences of [`codec::Key`]s used by the external sort.
//!
//! The run builder writes every full key buffer as a **run**; the merger
//! streams all runs back through a [`MergeIterator`] and writes the single
//! **merged stream** with the same [`RunWriter`]. Run files are
//! *write-once, read-once*: they are never modified after the rename that
//! publishes them.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ key (u32 LE) | key (u32 LE) | ... | key       │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! No header, no footer, no checksum. The file length is always a multiple
//! of [`KEY_BYTES`]; [`RunReader::open`] rejects anything else. Keys are in
//! ascending order; [`RunWriter`] refuses to write them otherwise.
//!
//! ## Example
//!
//! ```rust,no_run
//! use runs::{MergeIterator, RunReader, RunWriter};
//!
//! RunWriter::write_sorted("a.bin", &[1, 4, 9]).unwrap();
//! RunWriter::write_sorted("b.bin", &[2, 4]).unwrap();
//!
//! let readers = vec![RunReader::open("a.bin").unwrap(), RunReader::open("b.bin").unwrap()];
//! let mut merge = MergeIterator::new(readers).unwrap();
//! assert_eq!(merge.collect_all().unwrap(), vec![1, 2, 4, 4, 9]);
//! ```

mod error;
mod format;
mod merge;
mod reader;
mod writer;

pub use codec::{Key, KEY_BYTES};
pub use error::RunError;
pub use format::{run_file_name, RunHandle, MERGED_FILE_NAME, RUN_EXTENSION, TMP_EXTENSION};
pub use merge::{HeapEntry, HeapQueue, MergeIterator, MinQueue, SortedSource};
pub use reader::{RunReader, READ_BUFFER_BYTES};
pub use writer::{RunWriter, WRITE_BUFFER_BYTES};

#[cfg(test)]
mod tests;
