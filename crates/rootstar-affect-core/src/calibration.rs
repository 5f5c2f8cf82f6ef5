//! Baseline-adaptive quadrant estimation
//!
//! Maps raw EEG (valence, arousal) scores onto a circumplex quadrant relative
//! to a per-subject baseline.
//!
//! # Calibration Strategy
//!
//! 1. Bootstrap: collect the first [`BOOTSTRAP_SAMPLES`] scores and report
//!    [`EegLabel::Calibrating`]. On the last one, fix the baseline at their mean.
//! 2. Steady state: track slow baseline drift (electrode settling, fatigue)
//!    with an exponential moving average, then classify each score by the sign
//!    of its offset from the baseline on both axes.
//!
//! The stress metric is computed from the raw score in both phases.

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::math::{self, constants};
use crate::types::{EegLabel, EegMetrics, EegScore, Quadrant};

pub use constants::{BASELINE_EMA_ALPHA, BOOTSTRAP_SAMPLES, CALIBRATION_HISTORY};

/// Per-subject baseline state.
///
/// Owned by the [`QuadrantEstimator`]; reinitialised when the active subject changes.
#[derive(Clone, Debug)]
pub struct CalibrationState {
    center_valence: f64,
    center_arousal: f64,
    is_calibrated: bool,
    sample_count: u32,
    history: Deque<(f64, f64), CALIBRATION_HISTORY>,
}

impl CalibrationState {
    /// Fresh state centred on the neutral point
    #[must_use]
    pub const fn new() -> Self {
        Self {
            center_valence: constants::NEUTRAL_CENTER,
            center_arousal: constants::NEUTRAL_CENTER,
            is_calibrated: false,
            sample_count: 0,
            history: Deque::new(),
        }
    }

    /// Baseline valence, always in [0, 1]
    #[must_use]
    pub fn center_valence(&self) -> f64 {
        self.center_valence
    }

    /// Baseline arousal, always in [0, 1]
    #[must_use]
    pub fn center_arousal(&self) -> f64 {
        self.center_arousal
    }

    /// Whether the bootstrap phase has completed
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    /// Number of scores seen since the last reset
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Recent (valence, arousal) pairs, oldest first
    pub fn history(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.history.iter()
    }

    /// Number of pairs in the history window
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn push_history(&mut self, valence: f64, arousal: f64) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.history.push_back((valence, arousal));
    }

    fn history_mean(&self) -> (f64, f64) {
        let n = self.history.len();
        if n == 0 {
            return (constants::NEUTRAL_CENTER, constants::NEUTRAL_CENTER);
        }
        let (sv, sa) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(sv, sa), &(v, a)| (sv + v, sa + a));
        (sv / n as f64, sa / n as f64)
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one estimator step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadrantEstimate {
    /// Quadrant, or `Calibrating` during bootstrap
    pub label: EegLabel,
    /// Metrics from the raw score
    pub metrics: EegMetrics,
    /// Soft membership of the chosen quadrant, 0.0 while calibrating
    pub confidence: f64,
}

/// Baseline-adaptive valence/arousal to quadrant mapper.
#[derive(Clone, Debug, Default)]
pub struct QuadrantEstimator {
    state: CalibrationState,
}

impl QuadrantEstimator {
    /// Create an estimator with an empty baseline
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CalibrationState::new(),
        }
    }

    /// Current calibration state
    #[must_use]
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Discard the baseline (new subject)
    pub fn reset(&mut self) {
        self.state = CalibrationState::new();
    }

    /// Feed one score and classify it.
    ///
    /// Inputs are sanitised and clamped to [0, 1], never rejected.
    pub fn estimate(&mut self, score: EegScore) -> QuadrantEstimate {
        let metrics = EegMetrics::from_score(score);
        let (v, a) = (metrics.valence, metrics.arousal);
        let st = &mut self.state;

        if !st.is_calibrated {
            st.push_history(v, a);
            st.sample_count += 1;
            if st.sample_count >= BOOTSTRAP_SAMPLES {
                let (cv, ca) = st.history_mean();
                st.center_valence = cv;
                st.center_arousal = ca;
                st.is_calibrated = true;
            }
            return QuadrantEstimate {
                label: EegLabel::Calibrating,
                metrics,
                confidence: 0.0,
            };
        }

        st.center_valence = math::ema(st.center_valence, v, BASELINE_EMA_ALPHA).clamp(0.0, 1.0);
        st.center_arousal = math::ema(st.center_arousal, a, BASELINE_EMA_ALPHA).clamp(0.0, 1.0);
        st.push_history(v, a);
        st.sample_count = st.sample_count.saturating_add(1);

        let dv = v - st.center_valence;
        let da = a - st.center_arousal;
        let quadrant = Quadrant::from_offsets(dv, da);

        QuadrantEstimate {
            label: quadrant.into(),
            metrics,
            confidence: membership(dv, da),
        }
    }
}

/// Product of per-axis logistic memberships; 0.25 on the baseline, towards 1 far from it.
fn membership(dv: f64, da: f64) -> f64 {
    let k = constants::MEMBERSHIP_SLOPE;
    math::sigmoid(k * libm::fabs(dv)) * math::sigmoid(k * libm::fabs(da))
}
