//! Rootstar Affect Native - Host-side affect pipeline
//!
//! This crate runs the real-time affect pipeline on a host:
//! - Sensor adapters for an 8-channel EEG headset and a face camera
//! - EEG window preparation and spectral band power
//! - Local EEG and facial-expression models behind capability traits
//! - The tick loop driving calibration, smoothing and fusion
//! - Atomic snapshot publishing and a bounded history with CSV export
//!
//! # Modules
//!
//! - [`sensors`]: Adapter traits, raw frames, simulated hardware
//! - [`processing`]: FFT band power and resampling
//! - [`ml`]: Model traits and local models
//! - [`pipeline`]: Orchestrator, worker, snapshot store, history
//! - [`config`]: Pipeline configuration
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use rootstar_affect_native::{AffectPipeline, PipelineConfig, Sensors};
//!
//! # async fn run() -> rootstar_affect_native::PipelineResult<()> {
//! let config = PipelineConfig::default();
//! let handle = AffectPipeline::spawn(config.clone(), Sensors::simulated(&config))?;
//!
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! let snapshot = handle.snapshot();
//! println!("{}", snapshot.fusion.final_label.name());
//!
//! handle.shutdown().await
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod processing;
pub mod sensors;

// Re-export key types
pub use config::PipelineConfig;
pub use error::{Modality, PipelineError, PipelineResult};
pub use pipeline::{AffectPipeline, HistoryEntry, PipelineHandle, Sensors, SharedState, Snapshot};
