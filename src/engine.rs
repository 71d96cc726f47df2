//! Query evaluation: refresh-then-lookup producing a typed result.

use crate::config::RefreshMode;
use crate::corpus::{CorpusError, CorpusStore};
use std::sync::Arc;
use tracing::warn;

/// Machine-readable error category carried on the wire as an `ERROR` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    PermissionDenied,
    Unexpected,
}

impl ErrorKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::Unexpected => "UNEXPECTED",
        }
    }
}

impl From<&CorpusError> for ErrorKind {
    fn from(err: &CorpusError) -> Self {
        match err {
            CorpusError::NotFound(_) => ErrorKind::FileNotFound,
            CorpusError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CorpusError::Io(..) | CorpusError::Unavailable => ErrorKind::Unexpected,
        }
    }
}

/// Outcome of evaluating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    Found,
    NotFound,
    /// Empty or undecodable request body; never reached the corpus
    Invalid,
    /// No usable corpus snapshot exists
    Error(ErrorKind),
}

/// Orchestrates refresh-then-lookup against the shared corpus store.
///
/// Shared by reference across all connection handler threads; holds no
/// per-query state.
pub struct QueryEngine {
    store: Arc<dyn CorpusStore>,
    refresh: RefreshMode,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn CorpusStore>, refresh: RefreshMode) -> Self {
        Self { store, refresh }
    }

    /// Evaluate one request body (line terminator already stripped).
    ///
    /// Framing failures are rejected before any corpus work. A refresh
    /// failure degrades to the last good snapshot with a logged warning;
    /// only a store that has never loaded yields an error result.
    pub fn evaluate(&self, query: &[u8]) -> QueryResult {
        if query.is_empty() || std::str::from_utf8(query).is_err() {
            return QueryResult::Invalid;
        }

        // A store that never loaded retries here regardless of policy, so
        // a corpus that appears after startup is picked up.
        if self.refresh == RefreshMode::Always || !self.store.is_loaded() {
            if let Err(err) = self.store.refresh() {
                if self.store.is_loaded() {
                    warn!("corpus refresh failed, serving last good snapshot: {err}");
                } else {
                    return QueryResult::Error(ErrorKind::from(&err));
                }
            }
        }

        match self.store.contains(query) {
            Ok(true) => QueryResult::Found,
            Ok(false) => QueryResult::NotFound,
            Err(err) => QueryResult::Error(ErrorKind::from(&err)),
        }
    }
}
