//! Spectral EEG affect model
//!
//! Valence is the logistic of the frontal alpha asymmetry, arousal the
//! logistic of the mean beta/alpha log-ratio, both centred on reference
//! values. The estimator downstream re-centres on each subject's own
//! baseline, so the references only need to keep scores away from 0 and 1.

use std::sync::Mutex;

use rootstar_affect_core::math::sigmoid;
use rootstar_affect_core::EegScore;
use serde::{Deserialize, Serialize};

use super::features::AffectFeatureExtractor;
use super::preprocess::EegWindowPreparer;
use super::EegModel;
use crate::config::PipelineConfig;
use crate::error::{Modality, PipelineError, PipelineResult};
use crate::sensors::RawEegFrame;

/// Band-power model parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandPowerModelConfig {
    /// Samples per channel taken from each frame
    pub window_samples: usize,
    /// Samples per channel after resampling
    pub model_samples: usize,
    /// Sample rate after resampling (Hz)
    pub model_sample_rate_hz: f64,
    /// Logistic gain on frontal asymmetry
    pub valence_gain: f64,
    /// Logistic gain on engagement
    pub arousal_gain: f64,
    /// Engagement mapped to arousal 0.5
    pub engagement_reference: f64,
}

impl Default for BandPowerModelConfig {
    fn default() -> Self {
        Self::from_pipeline(&PipelineConfig::default())
    }
}

impl BandPowerModelConfig {
    /// Window geometry taken from the pipeline configuration
    #[must_use]
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            window_samples: config.min_eeg_samples,
            model_samples: config.model_input_samples,
            model_sample_rate_hz: config.model_sample_rate_hz(),
            valence_gain: 3.0,
            arousal_gain: 1.5,
            engagement_reference: -2.0,
        }
    }
}

struct ModelState {
    preparer: EegWindowPreparer,
    extractor: AffectFeatureExtractor,
}

/// Deterministic EEG model built on spectral band power.
pub struct BandPowerEegModel {
    config: BandPowerModelConfig,
    state: Mutex<ModelState>,
}

impl BandPowerEegModel {
    /// Create a model and plan its FFTs
    #[must_use]
    pub fn new(config: BandPowerModelConfig) -> Self {
        let state = ModelState {
            preparer: EegWindowPreparer::new(config.window_samples, config.model_samples),
            extractor: AffectFeatureExtractor::new(config.model_samples, config.model_sample_rate_hz),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Model parameters
    #[must_use]
    pub fn config(&self) -> &BandPowerModelConfig {
        &self.config
    }
}

impl Default for BandPowerEegModel {
    fn default() -> Self {
        Self::new(BandPowerModelConfig::default())
    }
}

impl EegModel for BandPowerEegModel {
    fn score(&self, frame: &RawEegFrame) -> PipelineResult<EegScore> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PipelineError::model(Modality::Eeg, "model state poisoned"))?;
        let ModelState { preparer, extractor } = &mut *state;

        let window = preparer.prepare(frame)?;
        let features = extractor.extract(&window)?;
        let engagement = features
            .engagement
            .ok_or_else(|| PipelineError::model(Modality::Eeg, "no alpha or beta power in window"))?;

        let cfg = &self.config;
        Ok(EegScore::new(
            sigmoid(cfg.valence_gain * features.frontal_asymmetry),
            sigmoid(cfg.arousal_gain * (engagement - cfg.engagement_reference)),
        ))
    }
}
