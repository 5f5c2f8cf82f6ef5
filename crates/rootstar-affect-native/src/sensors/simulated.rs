//! Simulated sensors for bench testing without hardware
//!
//! Both adapters follow the same slow [`MoodCycle`] so the fused output
//! wanders through all four quadrants:
//!
//! - EEG: 8 channels at the configured rate. Frontal alpha asymmetry tracks
//!   the valence phase, beta amplitude tracks the arousal phase. Every channel
//!   carries a DC offset and Gaussian noise.
//! - Camera: a grey face patch whose brightness tracks valence and whose
//!   texture contrast tracks arousal.
//!
//! Both can inject failures (lead artifacts, face dropouts) at fixed periods.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rootstar_affect_core::EegChannel;
use serde::{Deserialize, Serialize};

use super::{CameraAdapter, EegAdapter, RawEegFrame, RawFaceRegion};
use crate::error::{Modality, PipelineError, PipelineResult};

/// Slow valence/arousal oscillation shared by the simulated sensors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodCycle {
    /// Period of the valence oscillation in seconds
    pub period_secs: f64,
}

impl MoodCycle {
    /// Valence phase in [-1, 1]
    #[must_use]
    pub fn valence(&self, t_secs: f64) -> f64 {
        (2.0 * PI * t_secs / self.period_secs).sin()
    }

    /// Arousal phase in [-1, 1]; slower than valence so the pair never locks
    #[must_use]
    pub fn arousal(&self, t_secs: f64) -> f64 {
        (2.0 * PI * 0.7 * t_secs / self.period_secs).cos()
    }
}

impl Default for MoodCycle {
    fn default() -> Self {
        Self { period_secs: 40.0 }
    }
}

// ============================================================================
// Simulated EEG
// ============================================================================

/// Simulated EEG configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatedEegConfig {
    /// Sample rate (Hz)
    pub sample_rate_hz: f64,
    /// New samples generated per poll
    pub samples_per_poll: usize,
    /// DC offset on channel 0 (µV); later channels are scaled up slightly
    pub dc_offset_uv: f64,
    /// Gaussian noise level (µV)
    pub noise_uv: f64,
    /// Spike the first channel on every n-th poll
    pub artifact_every: Option<u64>,
    /// Shared mood oscillation
    pub mood: MoodCycle,
    /// Noise generator seed (must be non-zero)
    pub seed: u64,
}

impl Default for SimulatedEegConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 250.0,
            samples_per_poll: 25,
            dc_offset_uv: 150.0,
            noise_uv: 2.0,
            artifact_every: None,
            mood: MoodCycle::default(),
            seed: 0x2545_F491_4F6C_DD1D,
        }
    }
}

struct EegSimState {
    rows: Vec<VecDeque<f64>>,
    sample_index: u64,
    polls: u64,
    rng_state: u64,
}

impl EegSimState {
    fn gaussian_noise(&mut self) -> f64 {
        // Box-Muller transform
        let u1 = self.random_f64().max(f64::MIN_POSITIVE);
        let u2 = self.random_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn random_f64(&mut self) -> f64 {
        // xorshift64
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;
        (self.rng_state as f64) / (u64::MAX as f64)
    }
}

/// Synthetic 8-channel EEG headset.
pub struct SimulatedEegAdapter {
    config: SimulatedEegConfig,
    streaming: AtomicBool,
    state: Mutex<EegSimState>,
}

impl SimulatedEegAdapter {
    /// Create an adapter; streaming starts on [`EegAdapter::start`]
    #[must_use]
    pub fn new(config: SimulatedEegConfig) -> Self {
        let seed = if config.seed == 0 { 1 } else { config.seed };
        Self {
            state: Mutex::new(EegSimState {
                rows: vec![VecDeque::new(); EegChannel::COUNT],
                sample_index: 0,
                polls: 0,
                rng_state: seed,
            }),
            streaming: AtomicBool::new(false),
            config,
        }
    }

    /// Whether the stream is running
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    /// Simulated time of the newest sample, in seconds
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.sample_index as f64 / self.config.sample_rate_hz
    }

    fn sample(&self, state: &mut EegSimState, channel: usize, t: f64) -> f64 {
        let cfg = &self.config;
        let valence = cfg.mood.valence(t);
        let arousal = cfg.mood.arousal(t);

        let alpha_amp = match EegChannel::from_index(channel) {
            Some(EegChannel::Fp1) => 10.0 * (1.0 - 0.6 * valence),
            Some(EegChannel::Fp2) => 10.0 * (1.0 + 0.6 * valence),
            _ => 10.0,
        };
        let beta_amp = 4.0 * (1.0 + 0.6 * arousal);
        let phase = channel as f64 * 0.4;

        cfg.dc_offset_uv * (1.0 + 0.1 * channel as f64)
            + alpha_amp * (2.0 * PI * 10.0 * t + phase).sin()
            + beta_amp * (2.0 * PI * 21.0 * t + phase).sin()
            + cfg.noise_uv * state.gaussian_noise()
    }
}

impl Default for SimulatedEegAdapter {
    fn default() -> Self {
        Self::new(SimulatedEegConfig::default())
    }
}

impl EegAdapter for SimulatedEegAdapter {
    fn start(&self) -> PipelineResult<()> {
        self.streaming.store(true, Ordering::Release);
        tracing::debug!(rate_hz = self.config.sample_rate_hz, "Simulated EEG stream started");
        Ok(())
    }

    fn stop(&self) {
        if self.streaming.swap(false, Ordering::AcqRel) {
            tracing::debug!("Simulated EEG stream stopped");
        }
    }

    fn raw_buffer(&self, min_samples: usize) -> PipelineResult<Option<RawEegFrame>> {
        if !self.is_streaming() {
            return Ok(None);
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| PipelineError::adapter(Modality::Eeg, "sample buffer poisoned"))?;

        let capacity = min_samples.max((self.config.sample_rate_hz * 2.0) as usize);
        for _ in 0..self.config.samples_per_poll {
            let t = state.sample_index as f64 / self.config.sample_rate_hz;
            for ch in 0..EegChannel::COUNT {
                let v = self.sample(&mut state, ch, t);
                let row = &mut state.rows[ch];
                row.push_back(v);
                if row.len() > capacity {
                    row.pop_front();
                }
            }
            state.sample_index += 1;
        }
        state.polls += 1;

        let buffered = state.rows[0].len();
        if buffered < min_samples || min_samples == 0 {
            return Ok(None);
        }

        let mut rows: Vec<Vec<f64>> = state
            .rows
            .iter()
            .map(|row| row.iter().skip(buffered - min_samples).copied().collect())
            .collect();

        if let Some(n) = self.config.artifact_every {
            if n > 0 && state.polls % n == 0 {
                if let Some(last) = rows[0].last_mut() {
                    *last += 2000.0;
                }
            }
        }

        Ok(Some(RawEegFrame::new(rows)?))
    }
}

// ============================================================================
// Simulated Camera
// ============================================================================

/// Simulated camera configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatedCameraConfig {
    /// Face patch width (pixels)
    pub width: u32,
    /// Face patch height (pixels)
    pub height: u32,
    /// Simulated time between polls
    pub frame_period: Duration,
    /// Report "no face" on every n-th poll
    pub dropout_every: Option<u64>,
    /// Shared mood oscillation
    pub mood: MoodCycle,
}

impl Default for SimulatedCameraConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            frame_period: Duration::from_millis(100),
            dropout_every: None,
            mood: MoodCycle::default(),
        }
    }
}

/// Synthetic face camera.
pub struct SimulatedCameraAdapter {
    config: SimulatedCameraConfig,
    streaming: AtomicBool,
    polls: AtomicU64,
    last_hint: Mutex<String>,
}

impl SimulatedCameraAdapter {
    /// Create an adapter; capture starts on [`CameraAdapter::start`]
    #[must_use]
    pub fn new(config: SimulatedCameraConfig) -> Self {
        Self {
            config,
            streaming: AtomicBool::new(false),
            polls: AtomicU64::new(0),
            last_hint: Mutex::new(String::new()),
        }
    }

    /// Overlay label passed on the most recent poll
    #[must_use]
    pub fn last_hint(&self) -> String {
        self.last_hint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of polls served
    #[must_use]
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Acquire)
    }

    fn render(&self, t: f64) -> PipelineResult<RawFaceRegion> {
        let cfg = &self.config;
        let brightness = 0.5 + 0.35 * cfg.mood.valence(t);
        let contrast = 0.1 + 0.08 * cfg.mood.arousal(t);

        let mut pixels = Vec::with_capacity(cfg.width as usize * cfg.height as usize * 3);
        for y in 0..cfg.height {
            for x in 0..cfg.width {
                let checker = if (x + y) % 2 == 0 { 1.0 } else { -1.0 };
                let level = ((brightness + contrast * checker) * 255.0).clamp(0.0, 255.0);
                let px = level.round() as u8;
                pixels.extend_from_slice(&[px, px, px]);
            }
        }
        Ok(RawFaceRegion::new(cfg.width, cfg.height, pixels)?)
    }
}

impl Default for SimulatedCameraAdapter {
    fn default() -> Self {
        Self::new(SimulatedCameraConfig::default())
    }
}

impl CameraAdapter for SimulatedCameraAdapter {
    fn start(&self) -> PipelineResult<()> {
        self.streaming.store(true, Ordering::Release);
        tracing::debug!(width = self.config.width, height = self.config.height, "Simulated camera opened");
        Ok(())
    }

    fn stop(&self) {
        if self.streaming.swap(false, Ordering::AcqRel) {
            tracing::debug!("Simulated camera released");
        }
    }

    fn face_region(&self, hint_label: &str) -> PipelineResult<Option<RawFaceRegion>> {
        if !self.streaming.load(Ordering::Acquire) {
            return Ok(None);
        }
        hint_label.clone_into(&mut self.last_hint.lock().unwrap_or_else(PoisonError::into_inner));

        let poll = self.polls.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(n) = self.config.dropout_every {
            if n > 0 && poll % n == 0 {
                return Ok(None);
            }
        }
        let t = poll as f64 * self.config.frame_period.as_secs_f64();
        self.render(t).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eeg_silent_until_started() {
        let eeg = SimulatedEegAdapter::default();
        assert!(eeg.raw_buffer(250).unwrap().is_none());
        eeg.start().unwrap();
        assert!(eeg.is_streaming());
        eeg.stop();
        eeg.stop();
        assert!(!eeg.is_streaming());
    }

    #[test]
    fn test_eeg_warmup_then_frames() {
        let eeg = SimulatedEegAdapter::default();
        eeg.start().unwrap();
        // 25 samples per poll: nine polls are short of one second
        for _ in 0..9 {
            assert!(eeg.raw_buffer(250).unwrap().is_none());
        }
        let frame = eeg.raw_buffer(250).unwrap().unwrap();
        assert_eq!(frame.samples_per_channel(), 250);
        assert!(frame.validate(250, 480.0).is_ok());
        assert!((eeg.elapsed_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eeg_artifact_injection() {
        let eeg = SimulatedEegAdapter::new(SimulatedEegConfig {
            artifact_every: Some(12),
            ..SimulatedEegConfig::default()
        });
        eeg.start().unwrap();
        let mut rejected = 0;
        for _ in 0..24 {
            if let Some(frame) = eeg.raw_buffer(250).unwrap() {
                if frame.validate(250, 480.0).is_err() {
                    rejected += 1;
                }
            }
        }
        assert_eq!(rejected, 2);
    }

    #[test]
    fn test_camera_dropout_and_hint() {
        let cam = SimulatedCameraAdapter::new(SimulatedCameraConfig {
            dropout_every: Some(3),
            ..SimulatedCameraConfig::default()
        });
        assert!(cam.face_region("x").unwrap().is_none());
        assert_eq!(cam.polls(), 0);
        cam.start().unwrap();

        let results: Vec<bool> = (0..6)
            .map(|_| cam.face_region("Happy / Excited").unwrap().is_some())
            .collect();
        assert_eq!(results, vec![true, true, false, true, true, false]);
        assert_eq!(cam.last_hint(), "Happy / Excited");
        assert_eq!(cam.polls(), 6);
    }

    #[test]
    fn test_camera_brightness_follows_mood() {
        let cam = SimulatedCameraAdapter::default();
        cam.start().unwrap();
        // Quarter period (10 s) is peak valence
        let mut brightest = 0.0f64;
        for _ in 0..100 {
            if let Some(region) = cam.face_region("").unwrap() {
                let mean = region.luminance().sum::<f64>() / region.area() as f64;
                brightest = brightest.max(mean);
            }
        }
        assert!(brightest > 0.8);
    }
}
