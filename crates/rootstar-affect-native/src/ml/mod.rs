//! Model inference for affect estimation
//!
//! The orchestration loop only sees the [`EegModel`] and [`FaceModel`]
//! capability traits. The concrete models here run locally and
//! deterministically:
//!
//! - [`BandPowerEegModel`]: frontal alpha asymmetry and beta/alpha engagement
//! - [`SimulatedFaceModel`]: luminance statistics to expression logits
//!
//! A trained network plugs in by implementing the same traits.

pub mod eeg_model;
pub mod face_model;
pub mod features;
pub mod preprocess;

pub use eeg_model::{BandPowerEegModel, BandPowerModelConfig};
pub use face_model::{SimulatedFaceModel, SimulatedFaceModelConfig};
pub use features::{AffectFeatureExtractor, AffectFeatures};
pub use preprocess::{prepare_eeg_window, EegWindow, EegWindowPreparer};

use rootstar_affect_core::{EegScore, ExpressionProbs};

use crate::error::PipelineResult;
use crate::sensors::{RawEegFrame, RawFaceRegion};

/// EEG classifier producing valence and arousal.
pub trait EegModel: Send + Sync {
    /// Score a validated frame; values nominally in [0, 1]
    fn score(&self, frame: &RawEegFrame) -> PipelineResult<EegScore>;
}

/// Facial-expression classifier.
pub trait FaceModel: Send + Sync {
    /// Probabilities over the 8 expression labels in canonical order
    fn score(&self, region: &RawFaceRegion) -> PipelineResult<ExpressionProbs>;
}
