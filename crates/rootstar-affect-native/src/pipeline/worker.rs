//! Background worker and its handle
//!
//! The worker owns the [`Orchestrator`] and ticks it on a fixed interval.
//! Subject switches and the stop signal reach it over `watch` channels;
//! snapshot and history reads go straight to [`SharedState`] and never
//! wait on a tick.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::history::HistoryEntry;
use super::orchestrator::{Orchestrator, Sensors};
use super::shared::SharedState;
use super::snapshot::Snapshot;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Entry point for running the pipeline.
pub struct AffectPipeline;

impl AffectPipeline {
    /// Validate `config` and spawn the worker on the current tokio runtime.
    ///
    /// Adapters are started by the worker before its first tick.
    pub fn spawn(config: PipelineConfig, sensors: Sensors) -> PipelineResult<PipelineHandle> {
        config.validate()?;

        let shared = Arc::new(SharedState::new(&config));
        let (subject_tx, subject_rx) = watch::channel(config.initial_subject.clone());
        let (stop_tx, stop_rx) = watch::channel(false);

        let orchestrator = Orchestrator::new(config, sensors, Arc::clone(&shared));
        let task = tokio::spawn(run_worker(orchestrator, subject_rx, stop_rx));

        Ok(PipelineHandle {
            shared,
            subject_tx,
            stop_tx,
            task,
        })
    }
}

async fn run_worker(
    mut orchestrator: Orchestrator,
    mut subject_rx: watch::Receiver<String>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let period = orchestrator.config().tick_interval;
    tracing::info!(
        subject = orchestrator.subject_id(),
        tick = ?period,
        "Affect worker started"
    );

    orchestrator.start_sensors().await;

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = interval.tick() => {}
        }

        if subject_rx.has_changed().unwrap_or(false) {
            let subject = subject_rx.borrow_and_update().clone();
            orchestrator.set_active_subject(subject);
        }

        // Abandon the in-flight tick on stop
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            snapshot = orchestrator.tick() => {
                tracing::trace!(sequence = snapshot.sequence, label = snapshot.fusion.final_label.name(), "Tick");
            }
        }
    }

    orchestrator.stop_sensors().await;
    tracing::info!(subject = orchestrator.subject_id(), "Affect worker stopped");
}

/// Control and read handle for a running pipeline.
///
/// Dropping the handle without [`shutdown`](Self::shutdown) also stops the
/// worker at its next tick boundary.
pub struct PipelineHandle {
    shared: Arc<SharedState>,
    subject_tx: watch::Sender<String>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PipelineHandle {
    /// Latest snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.snapshot()
    }

    /// History, newest first
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.shared.history()
    }

    /// Read-only view that outlives borrows of the handle
    #[must_use]
    pub fn reader(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    /// Write the history as CSV
    pub fn export_history_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        self.shared.export_history_csv(writer)
    }

    /// Switch subject; applied at the start of the next tick
    pub fn set_active_subject(&self, subject_id: impl Into<String>) -> PipelineResult<()> {
        self.subject_tx
            .send(subject_id.into())
            .map_err(|_| PipelineError::WorkerStopped)
    }

    /// Whether the worker task is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the worker, wait for it to release the sensors
    pub async fn shutdown(self) -> PipelineResult<()> {
        // Fails only if the worker already exited
        let _ = self.stop_tx.send(true);
        self.task.await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use rootstar_affect_core::{EegLabel, FusionStatus};

    use crate::error::Modality;
    use crate::ml::{BandPowerEegModel, SimulatedFaceModel};
    use crate::sensors::{CameraAdapter, EegAdapter, RawEegFrame, RawFaceRegion};

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            tick_interval: Duration::from_millis(5),
            ..PipelineConfig::default()
        }
    }

    // Paced for 100 ms ticks, so one poll still yields 25 samples at 5 ms ticks
    fn fast_sensors() -> Sensors {
        Sensors::simulated(&PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            history_capacity: 0,
            ..PipelineConfig::default()
        };
        let sensors = Sensors::simulated(&config);
        assert!(matches!(
            AffectPipeline::spawn(config, sensors),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runs_and_shuts_down() {
        let config = fast_config();
        let sensors = fast_sensors();
        let handle = AffectPipeline::spawn(config, sensors).unwrap();

        let mut waited = 0;
        while handle.snapshot().sequence < 40 && waited < 400 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        let s = handle.snapshot();
        assert!(s.sequence >= 40);
        assert!(s.is_finite());
        assert_eq!(s.session_subject_id, "STANDBY");
        // Simulated EEG needs ten polls to fill one second, then twenty to calibrate
        assert!(s.eeg_emotion.is_some());
        assert!(handle.is_running());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subject_switch_restarts_calibration() {
        let config = fast_config();
        let sensors = fast_sensors();
        let handle = AffectPipeline::spawn(config, sensors).unwrap();

        let mut waited = 0;
        while handle.snapshot().eeg_emotion.map_or(true, |l| l == EegLabel::Calibrating) && waited < 400 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        assert!(handle.snapshot().eeg_emotion.and_then(EegLabel::quadrant).is_some());

        handle.set_active_subject("S02").unwrap();
        let mut waited = 0;
        while handle.snapshot().session_subject_id != "S02" && waited < 100 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            waited += 1;
        }
        let s = handle.snapshot();
        assert_eq!(s.session_subject_id, "S02");
        assert_eq!(s.eeg_emotion, Some(EegLabel::Calibrating));
        assert_eq!(s.fusion.status, FusionStatus::Standby);

        handle.shutdown().await.unwrap();
    }

    struct TrackedEeg(AtomicBool);

    impl EegAdapter for TrackedEeg {
        fn start(&self) -> PipelineResult<()> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn stop(&self) {
            self.0.store(false, Ordering::SeqCst);
        }
        fn raw_buffer(&self, _min_samples: usize) -> PipelineResult<Option<RawEegFrame>> {
            Ok(None)
        }
    }

    struct HungCamera;

    impl CameraAdapter for HungCamera {
        fn start(&self) -> PipelineResult<()> {
            Ok(())
        }
        fn stop(&self) {}
        fn face_region(&self, _hint: &str) -> PipelineResult<Option<RawFaceRegion>> {
            std::thread::sleep(Duration::from_millis(500));
            Err(PipelineError::adapter(Modality::Face, "unreachable"))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_releases_sensors_despite_hung_call() {
        let eeg = Arc::new(TrackedEeg(AtomicBool::new(false)));
        let sensors = Sensors::new(
            eeg.clone(),
            Arc::new(HungCamera),
            Arc::new(BandPowerEegModel::default()),
            Arc::new(SimulatedFaceModel::default()),
        );
        let config = PipelineConfig {
            tick_interval: Duration::from_millis(20),
            external_call_timeout: Duration::from_secs(5),
            ..PipelineConfig::default()
        };
        let handle = AffectPipeline::spawn(config, sensors).unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(eeg.0.load(Ordering::SeqCst));

        let started = std::time::Instant::now();
        handle.shutdown().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(!eeg.0.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_set_subject_after_exit_fails() {
        let config = fast_config();
        let sensors = fast_sensors();
        let handle = AffectPipeline::spawn(config, sensors).unwrap();
        let _ = handle.stop_tx.send(true);
        let mut waited = 0;
        while handle.is_running() && waited < 200 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            waited += 1;
        }
        assert!(matches!(handle.set_active_subject("S03"), Err(PipelineError::WorkerStopped)));
    }
}
