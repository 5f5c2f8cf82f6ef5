//! FFT-based spectral analysis
//!
//! Band power extraction for the spectral EEG model.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use rootstar_affect_core::{EegBand, SignalError};

/// FFT-based spectral analyzer
pub struct SpectralAnalyzer {
    fft_size: usize,
    sample_rate: f64,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    ///
    /// # Arguments
    ///
    /// * `fft_size` - FFT size (need not be a power of 2)
    /// * `sample_rate` - Sample rate in Hz
    #[must_use]
    pub fn new(fft_size: usize, sample_rate: f64) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft_size,
            sample_rate,
            fft,
            window: hann_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// FFT size
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency resolution (Hz per bin)
    #[must_use]
    pub fn frequency_resolution(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    /// Power spectrum of the most recent `fft_size` samples.
    ///
    /// Returns one-sided power (magnitude squared) for bins `0..=fft_size/2`.
    pub fn compute_psd(&mut self, samples: &[f64]) -> Result<Vec<f64>, SignalError> {
        if samples.len() < self.fft_size {
            return Err(SignalError::InsufficientSamples {
                available: samples.len(),
                required: self.fft_size,
            });
        }
        let recent = &samples[samples.len() - self.fft_size..];

        // Remove DC so electrode offset does not leak into the low bins
        let mean = recent.iter().sum::<f64>() / self.fft_size as f64;
        for ((slot, &s), &w) in self.buffer.iter_mut().zip(recent).zip(&self.window) {
            *slot = Complex::new((s - mean) * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n_freqs = self.fft_size / 2 + 1;
        let norm = 1.0 / (self.fft_size as f64).powi(2);

        Ok(self.buffer[..n_freqs]
            .iter()
            .map(|c| c.norm_sqr() * norm)
            .collect())
    }

    /// Sum of PSD bins within `[low_hz, high_hz]`, clipped to Nyquist
    #[must_use]
    pub fn band_power(&self, psd: &[f64], low_hz: f64, high_hz: f64) -> f64 {
        if psd.is_empty() {
            return 0.0;
        }
        let freq_res = self.frequency_resolution();
        let start_bin = (low_hz / freq_res).ceil() as usize;
        let end_bin = ((high_hz / freq_res).floor() as usize).min(psd.len() - 1);
        if start_bin > end_bin {
            return 0.0;
        }
        psd[start_bin..=end_bin].iter().sum()
    }

    /// Extract power for a standard EEG band
    #[must_use]
    pub fn eeg_band_power(&self, psd: &[f64], band: EegBand) -> f64 {
        let (low, high) = band.range_hz();
        self.band_power(psd, f64::from(low), f64::from(high))
    }

    /// Extract all standard EEG band powers
    #[must_use]
    pub fn all_band_powers(&self, psd: &[f64]) -> BandPowers {
        BandPowers {
            delta: self.eeg_band_power(psd, EegBand::Delta),
            theta: self.eeg_band_power(psd, EegBand::Theta),
            alpha: self.eeg_band_power(psd, EegBand::Alpha),
            beta: self.eeg_band_power(psd, EegBand::Beta),
            gamma: self.eeg_band_power(psd, EegBand::Gamma),
        }
    }
}

/// EEG band powers container
#[derive(Clone, Copy, Debug, Default)]
pub struct BandPowers {
    /// Delta band power (0.5-4 Hz)
    pub delta: f64,
    /// Theta band power (4-8 Hz)
    pub theta: f64,
    /// Alpha band power (8-13 Hz)
    pub alpha: f64,
    /// Beta band power (13-30 Hz)
    pub beta: f64,
    /// Gamma band power (30-100 Hz, clipped to Nyquist)
    pub gamma: f64,
}

impl BandPowers {
    /// Total power across all bands
    #[must_use]
    pub fn total(&self) -> f64 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }

    /// Natural log of beta/alpha (engagement); `None` if either band is empty
    #[must_use]
    pub fn log_beta_alpha(&self) -> Option<f64> {
        if self.alpha > 0.0 && self.beta > 0.0 {
            Some((self.beta / self.alpha).ln())
        } else {
            None
        }
    }
}

/// Generate Hann window coefficients
fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_alpha_peak() {
        let mut analyzer = SpectralAnalyzer::new(128, 128.0);
        let psd = analyzer.compute_psd(&sine(10.0, 128.0, 128)).unwrap();
        assert_eq!(psd.len(), 65);

        let alpha_power = analyzer.eeg_band_power(&psd, EegBand::Alpha);
        let total_power: f64 = psd.iter().sum();
        assert!(alpha_power > total_power * 0.9);
    }

    #[test]
    fn test_dc_offset_ignored() {
        let mut analyzer = SpectralAnalyzer::new(128, 128.0);
        let shifted: Vec<f64> = sine(20.0, 128.0, 128)
            .iter()
            .zip(sine(10.0, 128.0, 128))
            .map(|(b, a)| b + 0.1 * a + 300.0)
            .collect();
        let psd = analyzer.compute_psd(&shifted).unwrap();
        let powers = analyzer.all_band_powers(&psd);
        assert!(powers.beta > 10.0 * powers.delta);
        assert!(powers.log_beta_alpha().unwrap() > 0.0);
    }

    #[test]
    fn test_uses_most_recent_samples() {
        let mut analyzer = SpectralAnalyzer::new(64, 64.0);
        let mut samples = vec![0.0; 64];
        samples.extend(sine(10.0, 64.0, 64));
        let psd = analyzer.compute_psd(&samples).unwrap();
        assert!(analyzer.eeg_band_power(&psd, EegBand::Alpha) > 0.0);
    }

    #[test]
    fn test_insufficient_samples() {
        let mut analyzer = SpectralAnalyzer::new(128, 128.0);
        assert_eq!(
            analyzer.compute_psd(&[0.0; 10]),
            Err(SignalError::InsufficientSamples { available: 10, required: 128 })
        );
    }
}
