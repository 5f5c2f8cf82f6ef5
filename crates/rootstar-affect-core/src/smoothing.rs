//! Temporal smoothing of facial-expression probabilities
//!
//! A boxcar moving average over the last `N` probability vectors. It damps
//! single-frame misclassifications (a blink read as "surprise") without the
//! long tail of an exponential filter.
//!
//! The window reflects short-term optical stability, not subject identity,
//! so it is intentionally left alone when the active subject changes.

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::math::{self, constants};
use crate::types::{Expression, ExpressionProbs};

pub use constants::SMOOTHING_WINDOW;

/// Smoothed expression reading.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothedExpression {
    /// Element-wise mean over the window
    pub probs: ExpressionProbs,
    /// Label with the highest smoothed probability
    pub dominant: Expression,
    /// Smoothed probability of the dominant label
    pub confidence: f64,
}

impl SmoothedExpression {
    /// Derive dominant label and confidence from a probability vector
    #[must_use]
    pub fn from_probs(probs: ExpressionProbs) -> Self {
        let (idx, confidence) = math::argmax(&probs).unwrap_or((Expression::Neutral.index(), 0.0));
        Self {
            probs,
            dominant: Expression::from_index(idx).unwrap_or(Expression::Neutral),
            confidence: math::sanitize_unit(confidence),
        }
    }
}

/// Moving-average filter over expression probability vectors.
#[derive(Clone, Debug, Default)]
pub struct ExpressionSmoother<const N: usize = SMOOTHING_WINDOW> {
    buffer: Deque<ExpressionProbs, N>,
}

impl<const N: usize> ExpressionSmoother<N> {
    /// Create an empty smoother
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Deque::new() }
    }

    /// Push a frame and return the smoothed reading.
    ///
    /// `probs` should lie on the probability simplex. Frames without a
    /// detection must not be pushed; see [`math::check_probability_mass`].
    pub fn smooth(&mut self, probs: &ExpressionProbs) -> SmoothedExpression {
        let mut frame = *probs;
        math::sanitize_probs(&mut frame);

        if self.buffer.is_full() {
            self.buffer.pop_front();
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.buffer.push_back(frame);

        SmoothedExpression::from_probs(self.mean())
    }

    /// Current smoothed reading without pushing a frame
    #[must_use]
    pub fn current(&self) -> Option<SmoothedExpression> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(SmoothedExpression::from_probs(self.mean()))
        }
    }

    /// Frames currently in the window
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Window capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop every buffered frame
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn mean(&self) -> ExpressionProbs {
        let mut sum = [0.0; Expression::COUNT];
        for frame in self.buffer.iter() {
            for (acc, p) in sum.iter_mut().zip(frame) {
                *acc += p;
            }
        }
        let n = self.buffer.len().max(1) as f64;
        sum.map(|s| s / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn one_hot(e: Expression) -> ExpressionProbs {
        let mut p = [0.0; 8];
        p[e.index()] = 1.0;
        p
    }

    #[test]
    fn test_fixed_point() {
        let v = [0.05, 0.05, 0.1, 0.1, 0.4, 0.2, 0.05, 0.05];
        let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
        let mut out = smoother.smooth(&v);
        for _ in 0..20 {
            out = smoother.smooth(&v);
        }
        for (a, b) in out.probs.iter().zip(&v) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(out.dominant, Expression::Happy);
        assert!((out.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_distinct_frames() {
        let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
        let frames: Vec<ExpressionProbs> = Expression::ALL.iter().map(|&e| one_hot(e)).collect();
        let mut out = None;
        for f in &frames {
            out = Some(smoother.smooth(f));
        }
        let out = out.unwrap();
        for p in out.probs {
            assert!((p - 0.125).abs() < 1e-12);
        }
        // Ties go to the first label
        assert_eq!(out.dominant, Expression::Anger);
    }

    #[test]
    fn test_mean_over_last_window_after_eviction() {
        let frame = |i: usize| {
            let mut p = [0.0; 8];
            let w = i as f64 * 0.01;
            p[i % 8] = 1.0 - w;
            p[(i + 3) % 8] = w;
            p
        };
        let frames: Vec<ExpressionProbs> = (0..SMOOTHING_WINDOW + 6).map(frame).collect();

        let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
        let mut out = None;
        for f in &frames {
            out = Some(smoother.smooth(f));
        }
        let out = out.unwrap();
        assert_eq!(smoother.len(), SMOOTHING_WINDOW);

        let window = &frames[frames.len() - SMOOTHING_WINDOW..];
        for k in 0..8 {
            let expected = window.iter().map(|f| f[k]).sum::<f64>() / SMOOTHING_WINDOW as f64;
            assert!((out.probs[k] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_oldest_frame_evicted() {
        let mut smoother = ExpressionSmoother::<3>::new();
        smoother.smooth(&one_hot(Expression::Sad));
        smoother.smooth(&one_hot(Expression::Happy));
        smoother.smooth(&one_hot(Expression::Happy));
        let out = smoother.smooth(&one_hot(Expression::Neutral));
        assert_eq!(smoother.len(), 3);
        assert_eq!(out.probs[Expression::Sad.index()], 0.0);
        assert_eq!(out.dominant, Expression::Happy);
    }

    #[test]
    fn test_single_frame_jitter_is_damped() {
        let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
        for _ in 0..10 {
            smoother.smooth(&one_hot(Expression::Neutral));
        }
        let out = smoother.smooth(&one_hot(Expression::Surprise));
        assert_eq!(out.dominant, Expression::Neutral);
    }

    #[test]
    fn test_current_and_clear() {
        let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
        assert!(smoother.current().is_none());
        smoother.smooth(&one_hot(Expression::Fear));
        assert_eq!(smoother.current().map(|s| s.dominant), Some(Expression::Fear));
        smoother.clear();
        assert!(smoother.is_empty());
    }

    proptest! {
        #[test]
        fn prop_window_never_exceeds_capacity(pushes in 0usize..200, idx in 0usize..8) {
            let mut smoother = ExpressionSmoother::<SMOOTHING_WINDOW>::new();
            let frame = one_hot(Expression::ALL[idx]);
            for _ in 0..pushes {
                smoother.smooth(&frame);
                prop_assert!(smoother.len() <= smoother.capacity());
            }
            prop_assert_eq!(smoother.len(), pushes.min(SMOOTHING_WINDOW));
        }
    }
}
