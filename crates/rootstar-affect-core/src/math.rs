//! Numeric utilities for affect estimation
//!
//! Everything here is total over `f64`: non-finite inputs are mapped to 0.0
//! instead of propagating, so classifier output can be fed in unchecked.

use crate::error::SignalError;

/// Constants for the affect pipeline
pub mod constants {
    /// Samples collected before the subject baseline is fixed
    pub const BOOTSTRAP_SAMPLES: u32 = 20;

    /// Exponential moving average weight for baseline drift tracking
    pub const BASELINE_EMA_ALPHA: f64 = 0.05;

    /// Starting baseline on both axes
    pub const NEUTRAL_CENTER: f64 = 0.5;

    /// Capacity of the per-subject (valence, arousal) history window
    pub const CALIBRATION_HISTORY: usize = 100;

    /// Default length of the expression smoothing window (about 1 s at 15 fps)
    pub const SMOOTHING_WINDOW: usize = 15;

    /// Slope of the logistic used for quadrant membership confidence
    pub const MEMBERSHIP_SLOPE: f64 = 10.0;

    /// Probability mass below which a face vector is considered degenerate
    pub const MIN_PROBABILITY_MASS: f64 = 1e-6;
}

/// Map NaN and ±Inf to 0.0.
#[inline]
#[must_use]
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Sanitise, then clamp to [0, 1].
#[inline]
#[must_use]
pub fn sanitize_unit(x: f64) -> f64 {
    sanitize(x).clamp(0.0, 1.0)
}

/// Sanitise every entry in place and return the resulting sum.
pub fn sanitize_probs(probs: &mut [f64]) -> f64 {
    let mut sum = 0.0;
    for p in probs.iter_mut() {
        *p = sanitize(*p).max(0.0);
        sum += *p;
    }
    sum
}

/// Reject probability vectors that carry no mass (face lost, dead model).
///
/// Returns the sum on success.
pub fn check_probability_mass(probs: &[f64]) -> Result<f64, SignalError> {
    let sum: f64 = probs.iter().copied().map(sanitize).sum();
    if sum <= constants::MIN_PROBABILITY_MASS {
        Err(SignalError::DegenerateProbabilities { sum })
    } else {
        Ok(sum)
    }
}

/// Stress index `(1 - valence) * arousal`, clamped to [0, 1].
#[inline]
#[must_use]
pub fn stress(valence: f64, arousal: f64) -> f64 {
    ((1.0 - sanitize_unit(valence)) * sanitize_unit(arousal)).clamp(0.0, 1.0)
}

/// One exponential moving average step: `alpha * sample + (1 - alpha) * current`.
#[inline]
#[must_use]
pub fn ema(current: f64, sample: f64, alpha: f64) -> f64 {
    alpha * sample + (1.0 - alpha) * current
}

/// Logistic function.
#[inline]
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + libm::exp(-x))
}

/// Index and value of the largest entry; the first one wins on ties.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Numerically stable softmax over a fixed-size logit vector.
///
/// Non-finite logits are treated as 0.0.
#[must_use]
pub fn softmax<const N: usize>(logits: &[f64; N]) -> [f64; N] {
    let clean: [f64; N] = core::array::from_fn(|i| sanitize(logits[i]));
    let max = clean.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out: [f64; N] = core::array::from_fn(|i| libm::exp(clean[i] - max));
    let total: f64 = out.iter().sum();
    if total > 0.0 {
        for p in &mut out {
            *p /= total;
        }
    }
    out
}
