//! Feature extraction for the spectral EEG model
//!
//! Per-channel band powers over a prepared window, plus the two summary
//! features affect models are usually built on:
//!
//! - frontal alpha asymmetry `(Fp2α - Fp1α) / (Fp2α + Fp1α)`, a valence correlate
//! - mean `ln(β/α)` across channels, an arousal correlate

use rootstar_affect_core::{EegChannel, SignalError};

use super::preprocess::EegWindow;
use crate::processing::fft::{BandPowers, SpectralAnalyzer};

/// Features extracted from one window
#[derive(Clone, Debug, Default)]
pub struct AffectFeatures {
    /// Band powers per channel
    pub band_powers: [BandPowers; EegChannel::COUNT],
    /// Frontal alpha asymmetry in [-1, 1]
    pub frontal_asymmetry: f64,
    /// Mean `ln(β/α)` over channels with power in both bands
    pub engagement: Option<f64>,
}

/// Feature extractor for affect classification
pub struct AffectFeatureExtractor {
    analyzer: SpectralAnalyzer,
}

impl AffectFeatureExtractor {
    /// Create a new feature extractor
    ///
    /// # Arguments
    ///
    /// * `fft_size` - FFT size, normally the window length
    /// * `sample_rate` - Sample rate of the prepared window in Hz
    #[must_use]
    pub fn new(fft_size: usize, sample_rate: f64) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(fft_size, sample_rate),
        }
    }

    /// Extract features from a prepared window
    pub fn extract(&mut self, window: &EegWindow) -> Result<AffectFeatures, SignalError> {
        let mut band_powers = [BandPowers::default(); EegChannel::COUNT];
        for (powers, row) in band_powers.iter_mut().zip(window.rows()) {
            let psd = self.analyzer.compute_psd(row)?;
            *powers = self.analyzer.all_band_powers(&psd);
        }

        let fp1_alpha = band_powers[EegChannel::Fp1.index()].alpha;
        let fp2_alpha = band_powers[EegChannel::Fp2.index()].alpha;

        let ratios: Vec<f64> = band_powers.iter().filter_map(BandPowers::log_beta_alpha).collect();
        let engagement = if ratios.is_empty() {
            None
        } else {
            Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
        };

        Ok(AffectFeatures {
            band_powers,
            frontal_asymmetry: frontal_asymmetry(fp1_alpha, fp2_alpha),
            engagement,
        })
    }
}

/// `(right - left) / (right + left)`, or 0.0 when both are silent
fn frontal_asymmetry(left: f64, right: f64) -> f64 {
    let total = left + right;
    if total > 0.0 {
        (right - left) / total
    } else {
        0.0
    }
}
