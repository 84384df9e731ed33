//! K-way merge over sorted sources.
//!
//! Produces keys in ascending order from N independently sorted sources
//! while holding only one pending key per source. Duplicates are **kept**:
//! the output is the multiset union of the inputs, so its length is the sum
//! of the source lengths. Collapsing duplicates is the counter's job.
//!
//! The merge is written against two small capabilities:
//!
//! - [`SortedSource`]: a cursor that yields its next key or reports
//!   exhaustion ([`RunReader`](crate::RunReader) is one).
//! - [`MinQueue`]: an ordered container with `push`, `pop_min` and `len`
//!   ([`HeapQueue`] is the binary-heap implementation used by default).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::convert::Infallible;
use std::io::Read;

use codec::Key;

use crate::{RunError, RunReader};

/// A cursor over keys in non-decreasing order.
pub trait SortedSource {
    type Key: Ord + Copy;
    type Error;

    /// Returns the next key, or `Ok(None)` once the source is exhausted.
    fn next_key(&mut self) -> Result<Option<Self::Key>, Self::Error>;
}

impl<R: Read> SortedSource for RunReader<R> {
    type Key = Key;
    type Error = RunError;

    fn next_key(&mut self) -> Result<Option<Key>, RunError> {
        RunReader::next_key(self)
    }
}

impl<K: Ord + Copy> SortedSource for std::vec::IntoIter<K> {
    type Key = K;
    type Error = Infallible;

    fn next_key(&mut self) -> Result<Option<K>, Infallible> {
        Ok(self.next())
    }
}

/// An ordered container that always yields its smallest item first.
pub trait MinQueue<T: Ord> {
    fn push(&mut self, item: T);
    fn pop_min(&mut self) -> Option<T>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Binary-heap backed [`MinQueue`].
///
/// `BinaryHeap` is a max-heap, so items are wrapped in [`Reverse`].
pub type HeapQueue<K> = BinaryHeap<Reverse<HeapEntry<K>>>;

impl<T: Ord> MinQueue<T> for BinaryHeap<Reverse<T>> {
    fn push(&mut self, item: T) {
        BinaryHeap::push(self, Reverse(item));
    }

    fn pop_min(&mut self) -> Option<T> {
        self.pop().map(|Reverse(item)| item)
    }

    fn len(&self) -> usize {
        BinaryHeap::len(self)
    }
}

/// The pending front key of one source.
#[derive(Debug, Clone, Copy)]
pub struct HeapEntry<K> {
    pub key: K,
    /// Index into the merge's `sources`.
    pub source: usize,
}

impl<K: Ord> PartialEq for HeapEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl<K: Ord> Eq for HeapEntry<K> {}

impl<K: Ord> PartialOrd for HeapEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for HeapEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest key first. On tie, the lower source index wins
        // (arbitrary but deterministic).
        self.key
            .cmp(&other.key)
            .then_with(|| self.source.cmp(&other.source))
    }
}

/// Merges N sorted sources into one ascending stream.
///
/// Owns its sources: when the iterator is dropped, on success or on error,
/// every source (and any file handle inside it) is dropped with it.
///
/// Each emitted key costs one `pop_min` and at most one `push`, so a full
/// merge of T keys over N sources is O(T log N).
pub struct MergeIterator<S: SortedSource, Q = HeapQueue<<S as SortedSource>::Key>> {
    sources: Vec<S>,
    queue: Q,
}

impl<S: SortedSource> MergeIterator<S> {
    /// Creates a merge over `sources` backed by a binary heap.
    ///
    /// Reads the first key of every source; empty sources are never queued.
    pub fn new(sources: Vec<S>) -> Result<Self, S::Error> {
        let queue = BinaryHeap::with_capacity(sources.len());
        Self::with_queue(sources, queue)
    }
}

impl<S, Q> MergeIterator<S, Q>
where
    S: SortedSource,
    Q: MinQueue<HeapEntry<S::Key>>,
{
    /// Creates a merge over `sources` using a caller-supplied queue.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised while reading the initial keys.
    pub fn with_queue(mut sources: Vec<S>, mut queue: Q) -> Result<Self, S::Error> {
        for (i, source) in sources.iter_mut().enumerate() {
            if let Some(first_key) = source.next_key()? {
                queue.push(HeapEntry {
                    key: first_key,
                    source: i,
                });
            }
        }
        Ok(Self { sources, queue })
    }

    /// Returns the next key in ascending order, or `None` when every source
    /// is exhausted.
    pub fn next_key(&mut self) -> Result<Option<S::Key>, S::Error> {
        let top = match self.queue.pop_min() {
            Some(e) => e,
            None => return Ok(None),
        };

        // Refill from the source the key came from; an exhausted source is
        // simply not re-queued.
        if let Some(next_key) = self.sources[top.source].next_key()? {
            self.queue.push(HeapEntry {
                key: next_key,
                source: top.source,
            });
        }

        Ok(Some(top.key))
    }

    /// Collects all remaining keys into a `Vec`.
    ///
    /// Useful for testing; the pipeline streams instead.
    pub fn collect_all(&mut self) -> Result<Vec<S::Key>, S::Error> {
        let mut result = Vec::new();
        while let Some(key) = self.next_key()? {
            result.push(key);
        }
        Ok(result)
    }

    /// Number of sources the merge was built over.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of sources that still have keys pending.
    #[must_use]
    pub fn active_sources(&self) -> usize {
        self.queue.len()
    }
}

impl<S, Q> Iterator for MergeIterator<S, Q>
where
    S: SortedSource,
    Q: MinQueue<HeapEntry<S::Key>>,
{
    type Item = Result<S::Key, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}
