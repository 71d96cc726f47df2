//! Memory-mapped corpus store.
//!
//! Maps the corpus read-only and answers each query with a whole-line
//! substring scan against the mapping, copying nothing. Shares the
//! snapshot-swap and reload-coalescing discipline of
//! [`SetStore`](crate::corpus::SetStore): the mapping is replaced behind
//! an `Arc`, so in-flight scans keep their mapping alive while a remap
//! swaps in the next one.

use crate::corpus::snapshot::FileStamp;
use crate::corpus::{CorpusError, CorpusStore};
use memchr::memmem;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// One read-only mapping of the corpus plus the stamp it was opened at
struct MappedCorpus {
    /// None for a zero-length file, which cannot be mapped
    map: Option<Mmap>,
    stamp: FileStamp,
}

impl MappedCorpus {
    fn open(path: &Path) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|e| CorpusError::from_io(path, e))?;
        let stamp = FileStamp::from_file(&file).map_err(|e| CorpusError::from_io(path, e))?;

        let map = if stamp.is_empty() {
            None
        } else {
            Some(unsafe { Mmap::map(&file) }.map_err(|e| CorpusError::from_io(path, e))?)
        };

        Ok(Self { map, stamp })
    }

    fn data(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

/// Whole-line exact match of `line` inside `data`.
///
/// A hit counts only when the matched bytes are preceded by start-of-input
/// or `\n` and followed by `\n` or end-of-input. Corpus lines never contain
/// `\n`, so a query with an embedded newline can never be a member.
pub fn contains_line(data: &[u8], line: &[u8]) -> bool {
    if line.is_empty() || memchr::memchr(b'\n', line).is_some() {
        return false;
    }

    let pattern = memmem::Finder::new(line);
    for pos in pattern.find_iter(data) {
        let starts_line = pos == 0 || data[pos - 1] == b'\n';
        let end = pos + line.len();
        let ends_line = end == data.len() || data[end] == b'\n';
        if starts_line && ends_line {
            return true;
        }
    }
    false
}

pub struct MappedStore {
    path: PathBuf,
    current: RwLock<Option<Arc<MappedCorpus>>>,
    /// Serializes physical remaps; never held during scans
    reload: Mutex<()>,
}

impl MappedStore {
    /// Create an empty store; the first `refresh` maps the file
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            current: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    fn current_stamp(&self) -> Option<FileStamp> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|corpus| corpus.stamp)
    }

    fn remap(&self) -> Result<(), CorpusError> {
        let corpus = MappedCorpus::open(&self.path)?;
        *self.current.write().unwrap() = Some(Arc::new(corpus));
        Ok(())
    }
}

impl CorpusStore for MappedStore {
    fn contains(&self, line: &[u8]) -> Result<bool, CorpusError> {
        let corpus = self
            .current
            .read()
            .unwrap()
            .clone()
            .ok_or(CorpusError::Unavailable)?;
        Ok(contains_line(corpus.data(), line))
    }

    fn refresh(&self) -> Result<(), CorpusError> {
        let disk = FileStamp::probe(&self.path)
            .map_err(|e| CorpusError::from_io(&self.path, e))?;
        if self.current_stamp() == Some(disk) {
            return Ok(());
        }

        let _reload = self.reload.lock().unwrap();

        if self.current_stamp() == Some(disk) {
            return Ok(());
        }
        self.remap()
    }

    fn force_refresh(&self) -> Result<(), CorpusError> {
        let _reload = self.reload.lock().unwrap();
        self.remap()
    }

    fn is_loaded(&self) -> bool {
        self.current.read().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_contains_line_whole_line_only() {
        let data = b"ExactMatch\nAnotherLine\n";

        assert!(contains_line(data, b"ExactMatch"));
        assert!(contains_line(data, b"AnotherLine"));

        // substrings, superstrings, case variants
        assert!(!contains_line(data, b"Exact"));
        assert!(!contains_line(data, b"Match"));
        assert!(!contains_line(data, b"ExactMatchX"));
        assert!(!contains_line(data, b"exactmatch"));
    }

    #[test]
    fn test_contains_line_suffix_of_longer_line() {
        // "Match\n" occurs as a byte pattern but never as a whole line
        let data = b"PrefixMatch\n";
        assert!(!contains_line(data, b"Match"));
        assert!(contains_line(data, b"PrefixMatch"));
    }

    #[test]
    fn test_contains_line_first_and_last_lines() {
        let data = b"first\nmiddle\nlast";

        assert!(contains_line(data, b"first"));
        assert!(contains_line(data, b"middle"));
        // final line without a trailing newline still counts
        assert!(contains_line(data, b"last"));
        assert!(!contains_line(data, b"ast"));
    }

    #[test]
    fn test_contains_line_repeated_pattern() {
        // Early non-line hits must not mask a later whole-line hit
        let data = b"xxabxx\nab\n";
        assert!(contains_line(data, b"ab"));

        let data = b"abab\n";
        assert!(!contains_line(data, b"ab"));
    }

    #[test]
    fn test_contains_line_rejects_empty_and_embedded_newline() {
        let data = b"alpha\nbeta\n";

        assert!(!contains_line(data, b""));
        assert!(!contains_line(data, b"alpha\nbeta"));
    }

    #[test]
    fn test_contains_line_multibyte() {
        let data = "Üñîçødë\nascii\n".as_bytes();
        assert!(contains_line(data, "Üñîçødë".as_bytes()));
        assert!(!contains_line(data, "Üñîçød".as_bytes()));
    }

    #[test]
    fn test_store_refresh_picks_up_changed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "old-line\n").unwrap();

        let store = MappedStore::new(path.clone());
        store.refresh().unwrap();
        assert!(store.contains(b"old-line").unwrap());

        fs::write(&path, "replacement-line\n").unwrap();
        store.refresh().unwrap();

        assert!(!store.contains(b"old-line").unwrap());
        assert!(store.contains(b"replacement-line").unwrap());
    }

    #[test]
    fn test_store_handles_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "").unwrap();

        let store = MappedStore::new(path);
        store.refresh().unwrap();

        assert!(store.is_loaded());
        assert!(!store.contains(b"anything").unwrap());
    }

    #[test]
    fn test_store_refresh_failure_keeps_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "survivor\n").unwrap();

        let store = MappedStore::new(path.clone());
        store.refresh().unwrap();

        fs::remove_file(&path).unwrap();
        assert!(store.refresh().is_err());

        // The old mapping stays valid; the unlinked file's pages persist
        assert!(store.contains(b"survivor").unwrap());
    }
}
