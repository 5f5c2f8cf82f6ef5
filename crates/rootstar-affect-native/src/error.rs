//! Error types for the host-side affect pipeline
//!
//! Error types for adapters, models, and configuration using `thiserror`.
//! Inside the worker every error is contained to its tick: it is logged and
//! the affected modality is treated as absent.

use std::fmt;

use rootstar_affect_core::SignalError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sensing modality an error or reading belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Brain-electrical stream
    Eeg,
    /// Facial-expression stream
    Face,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eeg => write!(f, "EEG"),
            Self::Face => write!(f, "face"),
        }
    }
}

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Sensor reading failed validation
    #[error("Invalid input: {0}")]
    Signal(#[from] SignalError),

    /// Hardware adapter failed
    #[error("{modality} adapter error: {reason}")]
    Adapter {
        /// Affected modality
        modality: Modality,
        /// Error reason
        reason: String,
    },

    /// Model inference failed
    #[error("{modality} model inference failed: {reason}")]
    Model {
        /// Affected modality
        modality: Modality,
        /// Error reason
        reason: String,
    },

    /// External call exceeded its time budget
    #[error("{modality} call timed out after {timeout_ms}ms")]
    Timeout {
        /// Affected modality
        modality: Modality,
        /// Budget in milliseconds
        timeout_ms: u64,
    },

    /// Previous call to the same collaborator has not returned yet
    #[error("{modality} call skipped: previous call still running")]
    Busy {
        /// Affected modality
        modality: Modality,
    },

    /// Background worker has exited
    #[error("Pipeline worker is not running")]
    WorkerStopped,

    /// Blocking task panicked or was cancelled
    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History export failed
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Shorthand for an adapter failure
    pub fn adapter(modality: Modality, reason: impl Into<String>) -> Self {
        Self::Adapter { modality, reason: reason.into() }
    }

    /// Shorthand for a model failure
    pub fn model(modality: Modality, reason: impl Into<String>) -> Self {
        Self::Model { modality, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = PipelineError::Timeout { modality: Modality::Eeg, timeout_ms: 250 };
        assert_eq!(e.to_string(), "EEG call timed out after 250ms");

        let e = PipelineError::Busy { modality: Modality::Face };
        assert_eq!(e.to_string(), "face call skipped: previous call still running");

        let e: PipelineError = SignalError::EmptyFaceRegion.into();
        assert_eq!(e.to_string(), "Invalid input: Face region is empty");

        let e = PipelineError::model(Modality::Face, "tensor shape");
        assert_eq!(e.to_string(), "face model inference failed: tensor shape");
    }
}
