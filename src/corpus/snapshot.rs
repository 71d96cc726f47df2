//! Immutable point-in-time view of the corpus as a line set.

use crate::corpus::CorpusError;
use ahash::RandomState;
use std::collections::HashSet;
use std::fs::{File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

/// Modification stamp of the backing file: mtime plus length.
///
/// Length is part of the stamp because coarse mtime granularity on some
/// filesystems can miss back-to-back rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    mtime: SystemTime,
    len: u64,
}

impl FileStamp {
    /// Stat the file at `path`
    pub fn probe(path: &Path) -> io::Result<Self> {
        Self::from_metadata(&std::fs::metadata(path)?)
    }

    /// Stamp an already-opened file, avoiding a second path lookup
    pub fn from_file(file: &File) -> io::Result<Self> {
        Self::from_metadata(&file.metadata()?)
    }

    fn from_metadata(meta: &Metadata) -> io::Result<Self> {
        Ok(Self {
            mtime: meta.modified()?,
            len: meta.len(),
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Immutable set of corpus lines plus the stamp they were built from.
///
/// The stamp is probed before the file contents are read: if the file is
/// rewritten mid-read, the stamp is already stale and the next refresh
/// rebuilds, so a torn snapshot can never be mistaken for a fresh one.
#[derive(Debug)]
pub struct Snapshot {
    lines: HashSet<Box<[u8]>, RandomState>,
    stamp: FileStamp,
}

impl Snapshot {
    /// Read the file once and materialize its lines into a hash set.
    /// Empty lines are not stored; an empty query is rejected upstream.
    pub fn build(path: &Path) -> Result<Self, CorpusError> {
        let mut file = File::open(path).map_err(|e| CorpusError::from_io(path, e))?;
        let stamp = FileStamp::from_file(&file).map_err(|e| CorpusError::from_io(path, e))?;

        let mut bytes = Vec::with_capacity(stamp.len() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| CorpusError::from_io(path, e))?;

        let line_count = memchr::memchr_iter(b'\n', &bytes).count() + 1;
        let mut lines = HashSet::with_capacity_and_hasher(line_count, RandomState::new());
        for line in bytes.split(|b| *b == b'\n') {
            if !line.is_empty() {
                lines.insert(line.to_vec().into_boxed_slice());
            }
        }

        Ok(Self { lines, stamp })
    }

    /// Exact byte-equality membership test
    pub fn contains(&self, line: &[u8]) -> bool {
        !line.is_empty() && self.lines.contains(line)
    }

    /// Number of distinct non-empty lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn stamp(&self) -> FileStamp {
        self.stamp
    }
}
