//! Materialized-set corpus store.
//!
//! Holds the current [`Snapshot`] behind an `RwLock<Option<Arc<..>>>`.
//! Lookups clone the `Arc` and run against an immutable snapshot, so a
//! rebuild never blocks readers that already hold one. Rebuilds are gated
//! on the file's modification stamp and serialized through a dedicated
//! mutex: concurrent triggers coalesce into one physical reload, with
//! late arrivals observing its outcome via a re-check under the lock.

use crate::corpus::snapshot::{FileStamp, Snapshot};
use crate::corpus::{CorpusError, CorpusStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

pub struct SetStore {
    path: PathBuf,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes physical rebuilds; never held during lookups
    reload: Mutex<()>,
}

impl SetStore {
    /// Create an empty store; the first `refresh` builds the snapshot
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
            .map(|snap| snap.stamp())
    }

    /// Build a fresh snapshot and swap it in. The write lock is held only
    /// for the pointer swap, not for the file read.
    fn rebuild(&self) -> Result<(), CorpusError> {
        let snapshot = Snapshot::build(&self.path)?;
        *self.current.write().unwrap() = Some(Arc::new(snapshot));
        Ok(())
    }
}

impl CorpusStore for SetStore {
    fn contains(&self, line: &[u8]) -> Result<bool, CorpusError> {
        let snapshot = self
            .current
            .read()
            .unwrap()
            .clone()
            .ok_or(CorpusError::Unavailable)?;
        Ok(snapshot.contains(line))
    }

    fn refresh(&self) -> Result<(), CorpusError> {
        let disk = FileStamp::probe(&self.path)
            .map_err(|e| CorpusError::from_io(&self.path, e))?;
        if self.current_stamp() == Some(disk) {
            return Ok(());
        }

        let _reload = self.reload.lock().unwrap();

        // A concurrent trigger may have already rebuilt for this stamp
        if self.current_stamp() == Some(disk) {
            return Ok(());
        }
        self.rebuild()
    }

    fn force_refresh(&self) -> Result<(), CorpusError> {
        let _reload = self.reload.lock().unwrap();
        self.rebuild()
    }

    fn is_loaded(&self) -> bool {
        self.current.read().unwrap().is_some()
    }
}
