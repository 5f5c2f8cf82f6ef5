//! Published pipeline state
//!
//! A [`Snapshot`] is immutable once built. The [`SnapshotStore`] holds an
//! `Arc` to the latest one and swaps it under a write lock held only for the
//! pointer store, so a reader always gets a whole record from one tick.

use std::sync::{Arc, PoisonError, RwLock};

use rootstar_affect_core::math::sanitize;
use rootstar_affect_core::{EegChannel, EegLabel, EegMetrics, Expression, FusionDecision};
use serde::{Deserialize, Serialize};

/// State of the pipeline after one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Tick counter, 0 before the first tick
    pub sequence: u64,
    /// Active subject
    pub session_subject_id: String,
    /// EEG quadrant or `Calibrating`; `None` when EEG was absent
    pub eeg_emotion: Option<EegLabel>,
    /// Quadrant membership, 0.0 while calibrating or absent
    pub eeg_confidence: f64,
    /// Latest EEG metrics, zeros when absent
    pub eeg_metrics: EegMetrics,
    /// Latest centred sample per channel (µV)
    pub eeg_raw_sample: [f64; EegChannel::COUNT],
    /// Relative channel activity
    pub eeg_probs: [f64; EegChannel::COUNT],
    /// Smoothed dominant expression; `None` when no face was detected
    pub face_emotion: Option<Expression>,
    /// Smoothed probability of the dominant expression
    pub face_confidence: f64,
    /// Fusion outcome
    pub fusion: FusionDecision,
}

impl Snapshot {
    /// Neutral record for a subject with no readings yet
    #[must_use]
    pub fn standby(subject_id: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            session_subject_id: subject_id.into(),
            eeg_emotion: None,
            eeg_confidence: 0.0,
            eeg_metrics: EegMetrics::default(),
            eeg_raw_sample: [0.0; EegChannel::COUNT],
            eeg_probs: [0.0; EegChannel::COUNT],
            face_emotion: None,
            face_confidence: 0.0,
            fusion: FusionDecision::STANDBY,
        }
    }

    /// Replace every non-finite number with 0.0
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.eeg_confidence = sanitize(self.eeg_confidence);
        self.eeg_metrics.valence = sanitize(self.eeg_metrics.valence);
        self.eeg_metrics.arousal = sanitize(self.eeg_metrics.arousal);
        self.eeg_metrics.stress = sanitize(self.eeg_metrics.stress);
        self.eeg_raw_sample = self.eeg_raw_sample.map(sanitize);
        self.eeg_probs = self.eeg_probs.map(sanitize);
        self.face_confidence = sanitize(self.face_confidence);
        self.fusion.confidence = sanitize(self.fusion.confidence);
        self
    }

    /// Whether every numeric field is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let m = &self.eeg_metrics;
        [
            self.eeg_confidence,
            m.valence,
            m.arousal,
            m.stress,
            self.face_confidence,
            self.fusion.confidence,
        ]
        .iter()
        .chain(&self.eeg_raw_sample)
        .chain(&self.eeg_probs)
        .all(|x| x.is_finite())
    }
}

/// Single-writer, many-reader holder of the latest [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Create a store holding `initial`
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Latest snapshot; cheap, never blocks on a tick
    #[must_use]
    pub fn load(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the published snapshot and return the shared handle
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        next
    }
}
