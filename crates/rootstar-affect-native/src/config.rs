//! Pipeline configuration
//!
//! All tunables for the orchestration loop. Durations are (de)serialised as
//! integer milliseconds so a config file reads naturally:
//!
//! ```json
//! { "tick_interval_ms": 100, "initial_subject": "STANDBY" }
//! ```
//!
//! Missing keys fall back to [`PipelineConfig::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::history::MAX_HISTORY_CAPACITY;

/// Configuration for [`AffectPipeline`](crate::pipeline::AffectPipeline).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Period of the orchestration loop
    #[serde(rename = "tick_interval_ms", with = "duration_ms")]
    pub tick_interval: Duration,
    /// EEG samples per channel required for a valid frame (one second at 250 Hz)
    pub min_eeg_samples: usize,
    /// Samples per channel fed to the EEG model after resampling
    pub model_input_samples: usize,
    /// Native EEG sample rate
    pub eeg_sample_rate_hz: f64,
    /// Magnitude limit for the centred first-channel sample, in µV
    pub artifact_limit_uv: f64,
    /// History entries retained
    pub history_capacity: usize,
    /// Minimum spacing between history entries
    #[serde(rename = "history_interval_ms", with = "duration_ms")]
    pub history_interval: Duration,
    /// Budget for each adapter or model call
    #[serde(rename = "external_call_timeout_ms", with = "duration_ms")]
    pub external_call_timeout: Duration,
    /// Subject id active at start-up
    pub initial_subject: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            min_eeg_samples: 250,
            model_input_samples: 128,
            eeg_sample_rate_hz: 250.0,
            artifact_limit_uv: 480.0,
            history_capacity: 100,
            history_interval: Duration::from_secs(1),
            external_call_timeout: Duration::from_millis(250),
            initial_subject: "STANDBY".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse from a JSON string and validate
    pub fn from_json_str(text: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> PipelineResult<()> {
        if self.tick_interval.is_zero() {
            return Err(PipelineError::Config("tick_interval_ms must be positive".into()));
        }
        if self.external_call_timeout.is_zero() {
            return Err(PipelineError::Config(
                "external_call_timeout_ms must be positive".into(),
            ));
        }
        if self.min_eeg_samples < 2 || self.model_input_samples < 2 {
            return Err(PipelineError::Config(
                "min_eeg_samples and model_input_samples must be at least 2".into(),
            ));
        }
        if !(self.eeg_sample_rate_hz.is_finite() && self.eeg_sample_rate_hz > 0.0) {
            return Err(PipelineError::Config(format!(
                "eeg_sample_rate_hz must be positive, got {}",
                self.eeg_sample_rate_hz
            )));
        }
        if !(self.artifact_limit_uv.is_finite() && self.artifact_limit_uv > 0.0) {
            return Err(PipelineError::Config(format!(
                "artifact_limit_uv must be positive, got {}",
                self.artifact_limit_uv
            )));
        }
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(PipelineError::Config(format!(
                "history_capacity must be in 1..={MAX_HISTORY_CAPACITY}, got {}",
                self.history_capacity
            )));
        }
        if self.initial_subject.trim().is_empty() {
            return Err(PipelineError::Config("initial_subject must not be empty".into()));
        }
        Ok(())
    }

    /// Sample rate the EEG model sees after resampling
    #[must_use]
    pub fn model_sample_rate_hz(&self) -> f64 {
        self.eeg_sample_rate_hz * self.model_input_samples as f64 / self.min_eeg_samples as f64
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.tick_interval, Duration::from_millis(100));
        assert_eq!(c.min_eeg_samples, 250);
        assert_eq!(c.history_capacity, 100);
        assert_eq!(c.initial_subject, "STANDBY");
        assert!(c.validate().is_ok());
        assert!((c.model_sample_rate_hz() - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c = PipelineConfig::from_json_str(r#"{ "tick_interval_ms": 50, "initial_subject": "S01" }"#)
            .unwrap();
        assert_eq!(c.tick_interval, Duration::from_millis(50));
        assert_eq!(c.initial_subject, "S01");
        assert_eq!(c.external_call_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_json_roundtrip() {
        let c = PipelineConfig::default();
        let json = c.to_json_pretty().unwrap();
        assert!(json.contains("\"history_interval_ms\": 1000"));
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn test_invalid_rejected() {
        let err = PipelineConfig::from_json_str(r#"{ "tick_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let err = PipelineConfig::from_json_str(r#"{ "initial_subject": "  " }"#).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let err =
            PipelineConfig::from_json_str(r#"{ "history_capacity": 1000000000000000000 }"#).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let err = PipelineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(_)));
    }
}
