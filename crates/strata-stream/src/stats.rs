//! Read-only store statistics and error reporting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Kinds of recoverable terrain errors surfaced to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TerrainErrorKind {
    InvalidSettings,
    MeshSinkFailure,
    OutOfViewHeightQuery,
}

impl TerrainErrorKind {
    fn code(self) -> u8 {
        match self {
            Self::InvalidSettings => 1,
            Self::MeshSinkFailure => 2,
            Self::OutOfViewHeightQuery => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::InvalidSettings),
            2 => Some(Self::MeshSinkFailure),
            3 => Some(Self::OutOfViewHeightQuery),
            _ => None,
        }
    }
}

/// Most recent [`TerrainErrorKind`], writable through a shared reference so
/// height queries can record misses.
#[derive(Debug, Default)]
pub struct LastError(AtomicU8);

impl LastError {
    pub fn set(&self, kind: TerrainErrorKind) {
        self.0.store(kind.code(), Ordering::Relaxed);
    }

    pub fn get(&self) -> Option<TerrainErrorKind> {
        TerrainErrorKind::from_code(self.0.load(Ordering::Relaxed))
    }

    pub fn clear(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Messages kept by [`ErrorLog`].
pub const ERROR_LOG_CAPACITY: usize = 32;

/// Ring of the most recent error messages; the oldest entry is dropped
/// once full.
#[derive(Debug)]
pub struct ErrorLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Snapshot of the store for editor panels and telemetry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TerrainStats {
    /// Chunks resident in the store.
    pub loaded: usize,
    /// Coords waiting for heights, including in-flight worker tasks.
    pub pending_gen: usize,
    /// Chunks waiting for a mesh, including those backing off after a
    /// failed upload.
    pub pending_mesh: usize,
    pub visible: usize,
    pub total_triangles: usize,
    pub frame: u64,
    pub last_error_kind: Option<TerrainErrorKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_log_keeps_newest() {
        let mut log = ErrorLog::with_capacity(3);
        for i in 0..5 {
            log.push(format!("error {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["error 2", "error 3", "error 4"]);
        assert_eq!(log.last(), Some("error 4"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_default_capacity() {
        let mut log = ErrorLog::default();
        for i in 0..100 {
            log.push(i.to_string());
        }
        assert_eq!(log.len(), ERROR_LOG_CAPACITY);
        assert_eq!(log.iter().next(), Some("68"));
    }

    #[test]
    fn test_last_error_round_trips_kinds() {
        let last = LastError::default();
        assert_eq!(last.get(), None);
        for kind in [
            TerrainErrorKind::InvalidSettings,
            TerrainErrorKind::MeshSinkFailure,
            TerrainErrorKind::OutOfViewHeightQuery,
        ] {
            last.set(kind);
            assert_eq!(last.get(), Some(kind));
        }
        last.clear();
        assert_eq!(last.get(), None);
    }

    #[test]
    fn test_stats_serialize_to_json() {
        let stats = TerrainStats {
            loaded: 9,
            visible: 9,
            last_error_kind: Some(TerrainErrorKind::MeshSinkFailure),
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["loaded"], 9);
        assert_eq!(json["last_error_kind"], "MeshSinkFailure");
        assert_eq!(json["pending_gen"], 0);
    }
}
