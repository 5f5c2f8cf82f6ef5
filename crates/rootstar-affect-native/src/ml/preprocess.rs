//! EEG model input preparation
//!
//! Fixed-shape input for EEG models: the most recent window of each
//! channel, resampled to the model length, then z-scored as one block
//! (`(x - μ) / (σ + 1e-6)`).

use rootstar_affect_core::{EegChannel, SignalError};

use crate::processing::FourierResampler;
use crate::sensors::RawEegFrame;

const Z_SCORE_EPSILON: f64 = 1e-6;

/// Normalised model input, one row per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct EegWindow {
    data: [Vec<f64>; EegChannel::COUNT],
}

impl EegWindow {
    /// Rows in channel order
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>; EegChannel::COUNT] {
        &self.data
    }

    /// Samples for one channel
    #[must_use]
    pub fn channel(&self, channel: EegChannel) -> &[f64] {
        &self.data[channel.index()]
    }

    /// Samples per channel
    #[must_use]
    pub fn samples_per_channel(&self) -> usize {
        self.data[0].len()
    }
}

/// Reusable window preparer holding planned FFTs.
pub struct EegWindowPreparer {
    resampler: FourierResampler,
}

impl EegWindowPreparer {
    /// Plan for `window_samples` → `model_samples`
    #[must_use]
    pub fn new(window_samples: usize, model_samples: usize) -> Self {
        Self {
            resampler: FourierResampler::new(window_samples, model_samples),
        }
    }

    /// Prepare one frame
    pub fn prepare(&mut self, frame: &RawEegFrame) -> Result<EegWindow, SignalError> {
        let window = self.resampler.input_len();
        let available = frame.samples_per_channel();
        if available < window {
            return Err(SignalError::InsufficientSamples {
                available,
                required: window,
            });
        }

        let mut data: [Vec<f64>; EegChannel::COUNT] = Default::default();
        for (row, out) in frame.rows().iter().zip(data.iter_mut()) {
            let recent = &row[row.len() - window..];
            *out = self
                .resampler
                .resample(recent)
                .ok_or(SignalError::InsufficientSamples {
                    available: recent.len(),
                    required: window,
                })?;
        }
        z_score_block(&mut data);
        Ok(EegWindow { data })
    }
}

/// One-shot preparation; prefer [`EegWindowPreparer`] when called repeatedly
pub fn prepare_eeg_window(
    frame: &RawEegFrame,
    window_samples: usize,
    model_samples: usize,
) -> Result<EegWindow, SignalError> {
    EegWindowPreparer::new(window_samples, model_samples).prepare(frame)
}

/// Normalise all rows with one shared mean and standard deviation.
fn z_score_block(rows: &mut [Vec<f64>]) {
    let n: usize = rows.iter().map(Vec::len).sum();
    if n == 0 {
        return;
    }
    let n = n as f64;
    let mean = rows.iter().flatten().sum::<f64>() / n;
    let var = rows.iter().flatten().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let denom = var.sqrt() + Z_SCORE_EPSILON;
    for x in rows.iter_mut().flatten() {
        *x = (*x - mean) / denom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(len: usize) -> RawEegFrame {
        let rows = (0..8)
            .map(|ch| {
                (0..len)
                    .map(|i| 100.0 * ch as f64 + (2.0 * std::f64::consts::PI * 10.0 * i as f64 / 250.0).sin())
                    .collect()
            })
            .collect();
        RawEegFrame::new(rows).unwrap()
    }

    #[test]
    fn test_shape_and_normalisation() {
        let window = prepare_eeg_window(&frame(400), 250, 128).unwrap();
        assert_eq!(window.samples_per_channel(), 128);

        let all: Vec<f64> = window.rows().iter().flatten().copied().collect();
        let n = all.len() as f64;
        let mean = all.iter().sum::<f64>() / n;
        let std = (all.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1e-9);
        assert!((std - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_channel_order_preserved() {
        let window = prepare_eeg_window(&frame(250), 250, 128).unwrap();
        let means: Vec<f64> = window.rows().iter().map(|r| r.iter().sum::<f64>() / r.len() as f64).collect();
        assert!(means.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_short_frame_rejected() {
        assert_eq!(
            prepare_eeg_window(&frame(200), 250, 128),
            Err(SignalError::InsufficientSamples { available: 200, required: 250 })
        );
    }

    #[test]
    fn test_flat_block_stays_finite() {
        let rows = vec![vec![7.0; 250]; 8];
        let window = prepare_eeg_window(&RawEegFrame::new(rows).unwrap(), 250, 128).unwrap();
        assert!(window.rows().iter().flatten().all(|x| x.is_finite() && x.abs() < 1e-3));
    }
}
