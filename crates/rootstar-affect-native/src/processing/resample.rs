//! Fourier-domain resampling
//!
//! Changes the length of a block by truncating or zero-padding its spectrum,
//! the same construction as band-limited periodic interpolation. Used to bring
//! one second of EEG down to the model's fixed input length.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Resampler for a fixed input and output length.
pub struct FourierResampler {
    input_len: usize,
    output_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    spectrum: Vec<Complex<f64>>,
    resized: Vec<Complex<f64>>,
}

impl FourierResampler {
    /// Plan transforms for `input_len` → `output_len`
    #[must_use]
    pub fn new(input_len: usize, output_len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            input_len,
            output_len,
            forward: planner.plan_fft_forward(input_len),
            inverse: planner.plan_fft_inverse(output_len),
            spectrum: vec![Complex::new(0.0, 0.0); input_len],
            resized: vec![Complex::new(0.0, 0.0); output_len],
        }
    }

    /// Input length this resampler was planned for
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Output length this resampler was planned for
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Resample exactly `input_len` samples into `output_len` samples.
    ///
    /// Returns `None` if `samples` has the wrong length.
    pub fn resample(&mut self, samples: &[f64]) -> Option<Vec<f64>> {
        let (nx, num) = (self.input_len, self.output_len);
        if samples.len() != nx || nx == 0 || num == 0 {
            return None;
        }

        for (slot, &s) in self.spectrum.iter_mut().zip(samples) {
            *slot = Complex::new(s, 0.0);
        }
        self.forward.process(&mut self.spectrum);

        let zero = Complex::new(0.0, 0.0);
        self.resized.fill(zero);

        // Keep the lowest frequencies common to both lengths
        let n = nx.min(num);
        let nyq = n / 2 + 1;
        self.resized[..nyq].copy_from_slice(&self.spectrum[..nyq]);
        if n > 2 {
            let neg = n - nyq;
            self.resized[num - neg..].copy_from_slice(&self.spectrum[nx - neg..]);
        }
        // Split or fold the Nyquist bin for even lengths
        if n % 2 == 0 {
            if num < nx {
                let folded = self.spectrum[nx - n / 2];
                self.resized[num - n / 2] += folded;
            } else if nx < num {
                self.resized[n / 2] *= 0.5;
                self.resized[num - n / 2] = self.resized[n / 2];
            }
        }

        self.inverse.process(&mut self.resized);

        // rustfft leaves the inverse unnormalised
        let scale = 1.0 / nx as f64;
        Some(self.resized.iter().map(|c| c.re * scale).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_length() {
        let x: Vec<f64> = (0..16).map(|i| (i as f64 * 0.7).sin()).collect();
        let mut r = FourierResampler::new(16, 16);
        let y = r.resample(&x).unwrap();
        for (a, b) in x.iter().zip(&y) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_downsample_preserves_low_tone() {
        // 5 cycles over the block survive 250 → 128
        let x: Vec<f64> = (0..250).map(|i| (2.0 * PI * 5.0 * i as f64 / 250.0).sin()).collect();
        let mut r = FourierResampler::new(250, 128);
        let y = r.resample(&x).unwrap();
        assert_eq!(y.len(), 128);
        for (i, v) in y.iter().enumerate() {
            let expected = (2.0 * PI * 5.0 * i as f64 / 128.0).sin();
            assert!((v - expected).abs() < 1e-9, "sample {i}: {v} vs {expected}");
        }
    }

    #[test]
    fn test_constant_is_preserved() {
        let mut r = FourierResampler::new(250, 128);
        let y = r.resample(&[3.5; 250]).unwrap();
        assert!(y.iter().all(|v| (v - 3.5).abs() < 1e-9));
    }

    #[test]
    fn test_wrong_length() {
        let mut r = FourierResampler::new(250, 128);
        assert!(r.resample(&[0.0; 100]).is_none());
    }
}
