//! State shared between the worker and its readers

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use super::history::{self, HistoryEntry, HistoryLog};
use super::snapshot::{Snapshot, SnapshotStore};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// The latest snapshot and the history log.
///
/// Only the worker writes; any number of threads may read. Each lock is
/// held for a pointer swap or a ring-buffer insert, never across a tick.
#[derive(Debug)]
pub struct SharedState {
    snapshots: SnapshotStore,
    history: Mutex<HistoryLog>,
}

impl SharedState {
    /// Empty state for `config.initial_subject`
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            snapshots: SnapshotStore::new(Snapshot::standby(config.initial_subject.clone())),
            history: Mutex::new(HistoryLog::new(config.history_capacity, config.history_interval)),
        }
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.load()
    }

    /// Copy of the history, newest first
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).to_vec()
    }

    /// Number of history entries
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Write the history as CSV without holding the lock during I/O
    pub fn export_history_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        let entries = self.history();
        history::write_csv(&entries, writer)
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.snapshots.publish(snapshot)
    }

    pub(crate) fn append_history(&self, entry: HistoryEntry, now: Instant) -> bool {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_append(entry, now)
    }
}
