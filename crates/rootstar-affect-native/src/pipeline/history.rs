//! Bounded history of fused readings
//!
//! Entries are kept newest-first in a ring of fixed capacity. Appends are
//! rate-limited on a monotonic clock (at least `min_interval` apart) and
//! additionally never share a wall-clock second with the previous entry.

use std::collections::VecDeque;
use std::io::Write;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use rootstar_affect_core::{EegLabel, EegMetrics, Expression, FusionLabel};
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

/// Largest accepted history capacity
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

/// Timestamp format used in exports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// CSV header row
pub const CSV_HEADER: [&str; 7] = [
    "Timestamp",
    "Fusion Result",
    "EEG Emotion",
    "Face Emotion",
    "Valence",
    "Arousal",
    "Stress",
];

/// One sampled tick where both modalities were valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Local wall-clock time of the tick
    pub timestamp: DateTime<Local>,
    /// Fused label
    pub fusion_label: FusionLabel,
    /// EEG label (may be `Calibrating`)
    pub eeg_label: EegLabel,
    /// Smoothed dominant expression
    pub face_label: Expression,
    /// EEG metrics
    pub metrics: EegMetrics,
}

/// Newest-first bounded log.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    min_interval: Duration,
    last_append: Option<Instant>,
}

impl HistoryLog {
    /// Create an empty log; storage grows with the entries
    #[must_use]
    pub fn new(capacity: usize, min_interval: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            min_interval,
            last_append: None,
        }
    }

    /// Whether an append at `now` would pass the rate limit
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_append
            .map_or(true, |last| now.saturating_duration_since(last) >= self.min_interval)
    }

    /// Insert at the front if due; returns whether the entry was kept.
    pub fn try_append(&mut self, entry: HistoryEntry, now: Instant) -> bool {
        if self.capacity == 0 || !self.is_due(now) {
            return false;
        }
        if let Some(newest) = self.entries.front() {
            if same_second(&newest.timestamp, &entry.timestamp) {
                return false;
            }
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.last_append = Some(now);
        true
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Copy of the entries, newest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write the log as CSV
    pub fn to_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        write_csv(self.entries.iter(), writer)
    }
}

fn same_second(a: &DateTime<Local>, b: &DateTime<Local>) -> bool {
    a.timestamp() == b.timestamp()
}

/// Write entries as CSV in the order given
pub fn write_csv<'a, W, I>(entries: I, writer: W) -> PipelineResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for e in entries {
        wtr.write_record([
            e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            e.fusion_label.name().to_string(),
            e.eeg_label.name().to_string(),
            e.face_label.name().to_string(),
            format!("{:.2}", e.metrics.valence),
            format!("{:.2}", e.metrics.arousal),
            format!("{:.2}", e.metrics.stress),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
