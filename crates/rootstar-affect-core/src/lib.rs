//! Rootstar Affect Core - `no_std` compatible affect estimation primitives
//!
//! This crate holds the pure, allocation-free half of the affect pipeline:
//! everything that turns classifier scores into a fused affective state.
//! It performs no I/O and never fails on numeric input; non-finite values
//! are sanitised to 0.0 at the boundary.
//!
//! # Modules
//!
//! - [`types`]: Channels, quadrants, expression labels, scores and metrics
//! - [`math`]: Sanitising, stress, EMA, softmax and argmax helpers
//! - [`error`]: Input-validation errors
//! - [`calibration`]: Baseline-adaptive quadrant estimator
//! - [`smoothing`]: Moving-average expression smoother
//! - [`fusion`]: Rule-based multimodal fusion
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```rust
//! use rootstar_affect_core::calibration::QuadrantEstimator;
//! use rootstar_affect_core::types::{EegLabel, EegScore};
//!
//! let mut estimator = QuadrantEstimator::new();
//! for _ in 0..20 {
//!     assert_eq!(estimator.estimate(EegScore::new(0.5, 0.5)).label, EegLabel::Calibrating);
//! }
//! let estimate = estimator.estimate(EegScore::new(0.9, 0.2));
//! assert_eq!(estimate.label, EegLabel::RelaxedCalm);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod calibration;
pub mod error;
pub mod fusion;
pub mod math;
pub mod smoothing;
pub mod types;

// Re-export commonly used types at crate root
pub use calibration::{CalibrationState, QuadrantEstimate, QuadrantEstimator};
pub use error::SignalError;
pub use fusion::{fuse, FusionDecision, FusionLabel, FusionStatus};
pub use smoothing::{ExpressionSmoother, SmoothedExpression};
pub use types::{
    EegBand, EegChannel, EegLabel, EegMetrics, EegScore, Expression, ExpressionProbs, Quadrant,
};
