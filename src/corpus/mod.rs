//! Corpus stores: exact-line membership over a backing text file.
//!
//! Two interchangeable backends implement the same [`CorpusStore`]
//! capability and must produce identical results for identical input:
//!
//! - [`SetStore`] - parses the file once into an owned hash set; O(1)
//!   membership, O(file size) rebuild cost and memory
//! - [`MappedStore`] - maps the file read-only and scans it per query;
//!   O(file size) per query, O(1) extra memory, no parse step
//!
//! The choice between them is a deployment trade-off, never a correctness
//! difference. Both gate reloads on the file's modification stamp, coalesce
//! concurrent reload triggers into one physical rebuild, and swap snapshots
//! behind an `Arc` so readers holding the prior snapshot are never blocked.

pub mod mapped;
pub mod set_store;
pub mod snapshot;

pub use mapped::MappedStore;
pub use set_store::SetStore;
pub use snapshot::{FileStamp, Snapshot};

use crate::config::{Backend, ServerSettings};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a corpus lookup or reload failed
#[derive(Debug)]
pub enum CorpusError {
    /// Backing file does not exist
    NotFound(PathBuf),
    /// Backing file exists but is not readable
    PermissionDenied(PathBuf),
    /// Any other I/O failure while reading or mapping the file
    Io(PathBuf, io::Error),
    /// No snapshot has ever been built (initial load failed)
    Unavailable,
}

impl CorpusError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CorpusError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => CorpusError::PermissionDenied(path.to_path_buf()),
            _ => CorpusError::Io(path.to_path_buf(), err),
        }
    }
}

impl std::fmt::Display for CorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorpusError::NotFound(path) => write!(f, "corpus file not found: {}", path.display()),
            CorpusError::PermissionDenied(path) => {
                write!(f, "corpus file not readable: {}", path.display())
            }
            CorpusError::Io(path, err) => {
                write!(f, "corpus I/O error on {}: {}", path.display(), err)
            }
            CorpusError::Unavailable => write!(f, "no corpus snapshot available"),
        }
    }
}

impl std::error::Error for CorpusError {}

/// Exact-line membership over a backing file.
///
/// Implementations are shared across connection handler threads: `contains`
/// must be safe under arbitrary concurrent readers, and `refresh` must never
/// block readers that already hold the prior snapshot.
pub trait CorpusStore: Send + Sync {
    /// Exact membership test against the current snapshot
    fn contains(&self, line: &[u8]) -> Result<bool, CorpusError>;

    /// Resynchronize with the backing file if its modification stamp
    /// changed. Concurrent calls coalesce into one physical reload.
    fn refresh(&self) -> Result<(), CorpusError>;

    /// Rebuild unconditionally (administrative trigger)
    fn force_refresh(&self) -> Result<(), CorpusError>;

    /// Whether a usable snapshot exists
    fn is_loaded(&self) -> bool;
}

/// Construct the configured backend. The store starts empty; the caller
/// decides whether a failed initial load is fatal.
pub fn open_store(settings: &ServerSettings) -> Arc<dyn CorpusStore> {
    match settings.backend {
        Backend::Set => Arc::new(SetStore::new(settings.corpus_path.clone())),
        Backend::Mapped => Arc::new(MappedStore::new(settings.corpus_path.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn write_corpus(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    fn loaded_stores(path: &Path) -> Vec<(&'static str, Arc<dyn CorpusStore>)> {
        let set = SetStore::new(path.to_path_buf());
        set.refresh().unwrap();
        let mapped = MappedStore::new(path.to_path_buf());
        mapped.refresh().unwrap();
        vec![
            ("set", Arc::new(set) as Arc<dyn CorpusStore>),
            ("mapped", Arc::new(mapped) as Arc<dyn CorpusStore>),
        ]
    }

    // The same membership suite must hold for both backends.
    #[test]
    fn test_backends_agree_on_exact_match_semantics() {
        let (_dir, path) = write_corpus("ExactMatch\nAnotherLine\nÜñîçødë\n  padded  \n");

        for (name, store) in loaded_stores(&path) {
            assert!(store.contains(b"ExactMatch").unwrap(), "{name}");
            assert!(store.contains(b"AnotherLine").unwrap(), "{name}");
            assert!(store.contains("Üñîçødë".as_bytes()).unwrap(), "{name}");
            assert!(store.contains(b"  padded  ").unwrap(), "{name}");

            // case variants
            assert!(!store.contains(b"exactmatch").unwrap(), "{name}");
            assert!(!store.contains(b"EXACTMATCH").unwrap(), "{name}");
            // substrings and superstrings
            assert!(!store.contains(b"Exact").unwrap(), "{name}");
            assert!(!store.contains(b"Match").unwrap(), "{name}");
            assert!(!store.contains(b"ExactMatch2").unwrap(), "{name}");
            // added/removed whitespace
            assert!(!store.contains(b" ExactMatch").unwrap(), "{name}");
            assert!(!store.contains(b"ExactMatch ").unwrap(), "{name}");
            assert!(!store.contains(b"padded").unwrap(), "{name}");
        }
    }

    #[test]
    fn test_backends_agree_on_unterminated_final_line() {
        let (_dir, path) = write_corpus("first\nlast-no-newline");

        for (name, store) in loaded_stores(&path) {
            assert!(store.contains(b"first").unwrap(), "{name}");
            assert!(store.contains(b"last-no-newline").unwrap(), "{name}");
            assert!(!store.contains(b"no-newline").unwrap(), "{name}");
        }
    }

    #[test]
    fn test_backends_agree_on_embedded_newline_query() {
        // A query spanning two adjacent lines must not match either backend
        let (_dir, path) = write_corpus("alpha\nbeta\n");

        for (name, store) in loaded_stores(&path) {
            assert!(store.contains(b"alpha").unwrap(), "{name}");
            assert!(!store.contains(b"alpha\nbeta").unwrap(), "{name}");
        }
    }

    #[test]
    fn test_backends_agree_on_empty_corpus() {
        let (_dir, path) = write_corpus("");

        for (name, store) in loaded_stores(&path) {
            assert!(!store.contains(b"anything").unwrap(), "{name}");
        }
    }

    #[test]
    fn test_unloaded_store_reports_unavailable() {
        let set = SetStore::new(PathBuf::from("/nonexistent/corpus.txt"));
        assert!(!set.is_loaded());
        assert!(matches!(
            set.contains(b"x"),
            Err(CorpusError::Unavailable)
        ));
    }

    #[test]
    fn test_refresh_missing_file_maps_to_not_found() {
        let set = SetStore::new(PathBuf::from("/nonexistent/corpus.txt"));
        assert!(matches!(set.refresh(), Err(CorpusError::NotFound(_))));

        let mapped = MappedStore::new(PathBuf::from("/nonexistent/corpus.txt"));
        assert!(matches!(mapped.refresh(), Err(CorpusError::NotFound(_))));
    }
}
