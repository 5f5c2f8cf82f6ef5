//! Orchestration loop, snapshot publishing and history
//!
//! - [`orchestrator`]: one tick: acquire, validate, estimate, smooth, fuse, publish
//! - [`worker`]: background task ticking the orchestrator, plus its handle
//! - [`snapshot`]: immutable published record and its store
//! - [`history`]: bounded, rate-limited log with CSV export
//! - [`shared`]: state visible to readers

pub mod history;
pub mod orchestrator;
pub mod shared;
pub mod snapshot;
pub mod worker;

pub use history::{HistoryEntry, HistoryLog};
pub use orchestrator::{call_blocking, CallGate, EegReading, Orchestrator, Sensors, TickReadings};
pub use shared::SharedState;
pub use snapshot::{Snapshot, SnapshotStore};
pub use worker::{AffectPipeline, PipelineHandle};
