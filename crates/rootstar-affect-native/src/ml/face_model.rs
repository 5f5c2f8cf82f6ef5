//! Stand-in facial expression model
//!
//! Reads the synthetic face patch produced by
//! [`SimulatedCameraAdapter`](crate::sensors::SimulatedCameraAdapter):
//! mean luminance is taken as a valence cue, luminance spread as an arousal
//! cue. Each expression scores by how well its quadrant matches the cues,
//! and the logits go through a stable softmax.

use rootstar_affect_core::math::softmax;
use rootstar_affect_core::{Expression, ExpressionProbs, Quadrant, SignalError};
use serde::{Deserialize, Serialize};

use super::FaceModel;
use crate::error::PipelineResult;
use crate::sensors::RawFaceRegion;

/// Simulated face model parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatedFaceModelConfig {
    /// Logit gain on the quadrant match
    pub gain: f64,
    /// Luminance spread read as neutral arousal
    pub contrast_reference: f64,
    /// Spread change mapped to full arousal
    pub contrast_span: f64,
    /// Per-label prior added to the logits, canonical order
    pub bias: [f64; Expression::COUNT],
}

impl Default for SimulatedFaceModelConfig {
    fn default() -> Self {
        Self {
            gain: 3.0,
            contrast_reference: 0.1,
            contrast_span: 0.08,
            bias: [0.2, -0.5, -0.5, -0.2, 0.3, 0.3, 0.3, -0.3],
        }
    }
}

/// Luminance-driven expression model.
#[derive(Clone, Debug, Default)]
pub struct SimulatedFaceModel {
    config: SimulatedFaceModelConfig,
}

impl SimulatedFaceModel {
    /// Create a model
    #[must_use]
    pub fn new(config: SimulatedFaceModelConfig) -> Self {
        Self { config }
    }

    fn logits(&self, valence_cue: f64, arousal_cue: f64) -> [f64; Expression::COUNT] {
        let cfg = &self.config;
        std::array::from_fn(|i| {
            let (sv, sa) = match Expression::ALL[i].quadrant() {
                Quadrant::HappyExcited => (1.0, 1.0),
                Quadrant::StressedAngry => (-1.0, 1.0),
                Quadrant::SadBored => (-1.0, -1.0),
                Quadrant::RelaxedCalm => (1.0, -1.0),
            };
            cfg.gain * (sv * valence_cue + sa * arousal_cue) + cfg.bias[i]
        })
    }
}

impl FaceModel for SimulatedFaceModel {
    fn score(&self, region: &RawFaceRegion) -> PipelineResult<ExpressionProbs> {
        let n = region.area();
        if n == 0 {
            return Err(SignalError::EmptyFaceRegion.into());
        }
        let n = n as f64;
        let mean = region.luminance().sum::<f64>() / n;
        let spread = (region.luminance().map(|l| (l - mean).powi(2)).sum::<f64>() / n).sqrt();

        let cfg = &self.config;
        let valence_cue = (2.0 * (mean - 0.5)).clamp(-1.0, 1.0);
        let arousal_cue = if cfg.contrast_span > 0.0 {
            ((spread - cfg.contrast_reference) / cfg.contrast_span).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Ok(softmax(&self.logits(valence_cue, arousal_cue)))
    }
}
