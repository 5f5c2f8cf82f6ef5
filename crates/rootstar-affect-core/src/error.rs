//! Error types for Rootstar Affect
//!
//! Input-validation errors that work in `no_std` environments. None of them
//! is fatal: the pipeline treats every variant as "modality absent this tick".

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons a sensor reading is rejected before it reaches an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalError {
    /// Less than one second of EEG was available
    InsufficientSamples {
        /// Samples per channel in the frame
        available: usize,
        /// Samples per channel required
        required: usize,
    },
    /// First-channel reading looks like a disconnected or railing lead
    LeadArtifact {
        /// Offending centered value in µV
        value: f64,
        /// Magnitude limit in µV
        limit: f64,
    },
    /// Frame did not carry the expected number of channel rows
    ChannelCountMismatch {
        /// Rows received
        got: usize,
        /// Rows expected
        expected: usize,
    },
    /// Face detector returned a zero-area region
    EmptyFaceRegion,
    /// Face region pixel buffer does not match its dimensions
    MalformedFaceRegion {
        /// Bytes expected from width × height × 3
        expected: usize,
        /// Bytes received
        got: usize,
    },
    /// Expression probabilities carry no mass
    DegenerateProbabilities {
        /// Sum after sanitising
        sum: f64,
    },
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples { available, required } => {
                write!(f, "Insufficient EEG data: {available}/{required} samples")
            }
            Self::LeadArtifact { value, limit } => {
                write!(f, "Lead artifact on first channel: {value:.1} µV (limit ±{limit:.0} µV, zero rejected)")
            }
            Self::ChannelCountMismatch { got, expected } => {
                write!(f, "Channel count mismatch: got {got}, expected {expected}")
            }
            Self::EmptyFaceRegion => write!(f, "Face region is empty"),
            Self::MalformedFaceRegion { expected, got } => {
                write!(f, "Malformed face region: expected {expected} bytes, got {got}")
            }
            Self::DegenerateProbabilities { sum } => {
                write!(f, "Degenerate expression probabilities (sum {sum:.2e})")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SignalError {}
