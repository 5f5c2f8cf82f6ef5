//! Sensor adapters and raw readings
//!
//! The orchestration loop talks to hardware only through [`EegAdapter`] and
//! [`CameraAdapter`]. Calls are blocking; the loop runs each one on the
//! blocking pool under a timeout, so implementations may do synchronous I/O.
//!
//! Readings arrive as [`RawEegFrame`] and [`RawFaceRegion`] and must pass
//! validation before they reach a model.

pub mod simulated;

pub use simulated::{SimulatedCameraAdapter, SimulatedEegAdapter};

use rootstar_affect_core::{EegChannel, SignalError};

use crate::error::PipelineResult;

/// Multi-channel EEG source.
pub trait EegAdapter: Send + Sync {
    /// Begin streaming
    fn start(&self) -> PipelineResult<()>;

    /// Stop streaming; must be safe to call more than once
    fn stop(&self);

    /// Latest `min_samples` samples per channel, or `None` if fewer are buffered
    fn raw_buffer(&self, min_samples: usize) -> PipelineResult<Option<RawEegFrame>>;
}

/// Face-region source.
pub trait CameraAdapter: Send + Sync {
    /// Open the camera
    fn start(&self) -> PipelineResult<()>;

    /// Release the camera; must be safe to call more than once
    fn stop(&self);

    /// Current face region, or `None` when no face is detected.
    ///
    /// `hint_label` is the last published face expression (`"none"` before
    /// the first detection), for overlays.
    fn face_region(&self, hint_label: &str) -> PipelineResult<Option<RawFaceRegion>>;
}

// ============================================================================
// EEG Frames
// ============================================================================

/// Channel-major block of EEG samples in µV.
///
/// Rows follow [`EegChannel`] order and always have equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEegFrame {
    rows: Vec<Vec<f64>>,
}

impl RawEegFrame {
    /// Build a frame from one row per channel.
    ///
    /// Ragged rows are cut to their common most-recent tail.
    pub fn new(mut rows: Vec<Vec<f64>>) -> Result<Self, SignalError> {
        if rows.len() != EegChannel::COUNT {
            return Err(SignalError::ChannelCountMismatch {
                got: rows.len(),
                expected: EegChannel::COUNT,
            });
        }
        let len = rows.iter().map(Vec::len).min().unwrap_or(0);
        for row in &mut rows {
            let excess = row.len() - len;
            row.drain(..excess);
        }
        Ok(Self { rows })
    }

    /// Samples per channel
    #[must_use]
    pub fn samples_per_channel(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// All rows in channel order
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Samples for one channel
    #[must_use]
    pub fn channel(&self, channel: EegChannel) -> &[f64] {
        &self.rows[channel.index()]
    }

    /// Latest sample of each channel minus that channel's mean over the frame
    #[must_use]
    pub fn latest_centered(&self) -> [f64; EegChannel::COUNT] {
        std::array::from_fn(|ch| {
            let row = &self.rows[ch];
            match row.last() {
                Some(&last) => last - mean(row),
                None => 0.0,
            }
        })
    }

    /// Share of total variance carried by each channel.
    ///
    /// Sums to 1, or is all zeros for a flat frame.
    #[must_use]
    pub fn channel_activity(&self) -> [f64; EegChannel::COUNT] {
        let variances: [f64; EegChannel::COUNT] = std::array::from_fn(|ch| {
            let v = variance(&self.rows[ch]);
            if v.is_finite() {
                v
            } else {
                0.0
            }
        });
        let total: f64 = variances.iter().sum();
        if total > 0.0 {
            variances.map(|v| v / total)
        } else {
            [0.0; EegChannel::COUNT]
        }
    }

    /// Reject frames that are too short or show a lead artifact.
    ///
    /// The centred first-channel sample must be finite, non-zero, and below
    /// `artifact_limit_uv` in magnitude.
    pub fn validate(&self, min_samples: usize, artifact_limit_uv: f64) -> Result<(), SignalError> {
        let available = self.samples_per_channel();
        if available < min_samples {
            return Err(SignalError::InsufficientSamples {
                available,
                required: min_samples,
            });
        }
        let value = self.latest_centered()[EegChannel::Fp1.index()];
        if !value.is_finite() || value == 0.0 || value.abs() >= artifact_limit_uv {
            return Err(SignalError::LeadArtifact {
                value,
                limit: artifact_limit_uv,
            });
        }
        Ok(())
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

// ============================================================================
// Face Regions
// ============================================================================

/// Cropped face image, RGB8 row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFaceRegion {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RawFaceRegion {
    /// Bytes per pixel
    pub const CHANNELS: usize = 3;

    /// Wrap a pixel buffer, checking it against the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SignalError> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if expected == 0 {
            return Err(SignalError::EmptyFaceRegion);
        }
        if pixels.len() != expected {
            return Err(SignalError::MalformedFaceRegion {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB8 bytes
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Per-pixel luminance in [0, 1] (Rec. 601 weights)
    pub fn luminance(&self) -> impl Iterator<Item = f64> + '_ {
        self.pixels.chunks_exact(Self::CHANNELS).map(|px| {
            (0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2])) / 255.0
        })
    }

    /// Number of pixels
    #[must_use]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(len: usize, f: impl Fn(usize, usize) -> f64) -> RawEegFrame {
        let rows = (0..8).map(|ch| (0..len).map(|i| f(ch, i)).collect()).collect();
        RawEegFrame::new(rows).unwrap()
    }

    #[test]
    fn test_channel_count_checked() {
        let err = RawEegFrame::new(vec![vec![0.0; 10]; 7]).unwrap_err();
        assert_eq!(err, SignalError::ChannelCountMismatch { got: 7, expected: 8 });
    }

    #[test]
    fn test_ragged_rows_keep_latest_tail() {
        let mut rows = vec![vec![1.0, 2.0, 3.0]; 8];
        rows[3] = vec![2.0, 3.0];
        let frame = RawEegFrame::new(rows).unwrap();
        assert_eq!(frame.samples_per_channel(), 2);
        assert_eq!(frame.channel(EegChannel::Fp1), &[2.0, 3.0]);
    }

    #[test]
    fn test_latest_centered() {
        let frame = frame_with(4, |ch, i| (ch * 10 + i) as f64);
        // row = [c, c+1, c+2, c+3], mean = c+1.5, last - mean = 1.5
        for v in frame.latest_centered() {
            assert!((v - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_validation() {
        let short = frame_with(100, |_, i| (i % 7) as f64);
        assert!(matches!(
            short.validate(250, 480.0),
            Err(SignalError::InsufficientSamples { available: 100, required: 250 })
        ));

        let ok = frame_with(250, |_, i| (i as f64 * 0.3).sin() * 20.0);
        assert!(ok.validate(250, 480.0).is_ok());

        let flat = frame_with(250, |_, _| 5.0);
        assert!(matches!(flat.validate(250, 480.0), Err(SignalError::LeadArtifact { .. })));

        let spike = frame_with(250, |_, i| if i == 249 { 2000.0 } else { 0.0 });
        assert!(matches!(spike.validate(250, 480.0), Err(SignalError::LeadArtifact { .. })));
    }

    #[test]
    fn test_channel_activity() {
        let frame = frame_with(64, |ch, i| if ch < 2 { (i as f64).sin() } else { 0.0 });
        let act = frame.channel_activity();
        assert!((act.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((act[0] - 0.5).abs() < 1e-12);
        assert_eq!(act[5], 0.0);

        let flat = frame_with(64, |_, _| 1.0);
        assert_eq!(flat.channel_activity(), [0.0; 8]);
    }

    #[test]
    fn test_face_region() {
        assert_eq!(RawFaceRegion::new(0, 10, vec![]), Err(SignalError::EmptyFaceRegion));
        assert_eq!(
            RawFaceRegion::new(2, 2, vec![0; 5]),
            Err(SignalError::MalformedFaceRegion { expected: 12, got: 5 })
        );
        let region = RawFaceRegion::new(2, 1, vec![255, 255, 255, 0, 0, 0]).unwrap();
        let lum: Vec<f64> = region.luminance().collect();
        assert!((lum[0] - 1.0).abs() < 1e-9);
        assert_eq!(lum[1], 0.0);
        assert_eq!(region.area(), 2);
    }
}
