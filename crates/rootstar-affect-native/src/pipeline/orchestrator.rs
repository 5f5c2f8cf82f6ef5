//! One tick of the affect pipeline
//!
//! A tick has two halves:
//!
//! 1. [`Orchestrator::acquire`] pulls both modalities concurrently. Every
//!    adapter and model call runs on the blocking pool under the configured
//!    timeout; a failure, a timeout or a rejected reading leaves that
//!    modality absent for the tick. Each collaborator has a [`CallGate`]:
//!    while an abandoned call is still running, later ticks skip that
//!    collaborator instead of stacking more threads behind it.
//! 2. [`Orchestrator::apply`] is synchronous: it drives the estimator, the
//!    smoother and fusion, publishes the snapshot and samples the history.
//!
//! The estimator and smoother are owned here and never shared.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::Semaphore;
use rootstar_affect_core::math::{self, sanitize};
use rootstar_affect_core::{
    fuse, EegChannel, EegScore, Expression, ExpressionProbs, ExpressionSmoother, FusionStatus, QuadrantEstimator,
};

use super::history::HistoryEntry;
use super::shared::SharedState;
use super::snapshot::Snapshot;
use crate::config::PipelineConfig;
use crate::error::{Modality, PipelineError, PipelineResult};
use crate::ml::{BandPowerEegModel, BandPowerModelConfig, EegModel, FaceModel, SimulatedFaceModel};
use crate::sensors::simulated::{SimulatedCameraConfig, SimulatedEegConfig};
use crate::sensors::{CameraAdapter, EegAdapter, SimulatedCameraAdapter, SimulatedEegAdapter};

/// External collaborators the pipeline drives.
#[derive(Clone)]
pub struct Sensors {
    /// EEG headset
    pub eeg: Arc<dyn EegAdapter>,
    /// Face camera
    pub camera: Arc<dyn CameraAdapter>,
    /// EEG classifier
    pub eeg_model: Arc<dyn EegModel>,
    /// Expression classifier
    pub face_model: Arc<dyn FaceModel>,
}

impl Sensors {
    /// Bundle adapters and models
    pub fn new(
        eeg: Arc<dyn EegAdapter>,
        camera: Arc<dyn CameraAdapter>,
        eeg_model: Arc<dyn EegModel>,
        face_model: Arc<dyn FaceModel>,
    ) -> Self {
        Self {
            eeg,
            camera,
            eeg_model,
            face_model,
        }
    }

    /// Simulated hardware paced to the tick interval, with the local models
    #[must_use]
    pub fn simulated(config: &PipelineConfig) -> Self {
        Self::simulated_with_faults(config, None, None)
    }

    /// Simulated hardware that injects a lead artifact on every
    /// `artifact_every`-th EEG poll and loses the face on every
    /// `dropout_every`-th camera poll
    #[must_use]
    pub fn simulated_with_faults(
        config: &PipelineConfig,
        artifact_every: Option<u64>,
        dropout_every: Option<u64>,
    ) -> Self {
        let samples_per_poll =
            (config.eeg_sample_rate_hz * config.tick_interval.as_secs_f64()).round().max(1.0) as usize;
        Self::new(
            Arc::new(SimulatedEegAdapter::new(SimulatedEegConfig {
                sample_rate_hz: config.eeg_sample_rate_hz,
                samples_per_poll,
                artifact_every,
                ..SimulatedEegConfig::default()
            })),
            Arc::new(SimulatedCameraAdapter::new(SimulatedCameraConfig {
                frame_period: config.tick_interval,
                dropout_every,
                ..SimulatedCameraConfig::default()
            })),
            Arc::new(BandPowerEegModel::new(BandPowerModelConfig::from_pipeline(config))),
            Arc::new(SimulatedFaceModel::default()),
        )
    }
}

/// Validated EEG input for one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EegReading {
    /// Model output
    pub score: EegScore,
    /// Latest centred sample per channel
    pub raw_sample: [f64; EegChannel::COUNT],
    /// Relative channel activity
    pub channel_activity: [f64; EegChannel::COUNT],
}

/// Everything acquired in one tick; `None` means absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReadings {
    /// EEG reading
    pub eeg: Option<EegReading>,
    /// Face model probabilities
    pub face: Option<ExpressionProbs>,
}

/// Run a blocking call on the blocking pool with a deadline.
///
/// On timeout the call is abandoned; its thread finishes in the background.
pub async fn call_blocking<T, F>(modality: Modality, timeout: Duration, f: F) -> PipelineResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(joined) => joined?,
        Err(_) => Err(PipelineError::Timeout {
            modality,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Admits one blocking call at a time for a single external collaborator.
///
/// The permit travels into the blocking closure, so a call abandoned on
/// timeout keeps the gate closed until its thread actually returns.
#[derive(Clone, Debug)]
pub struct CallGate {
    modality: Modality,
    permit: Arc<Semaphore>,
}

impl CallGate {
    /// Open gate for calls on behalf of `modality`
    #[must_use]
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Whether a previous call has not returned yet
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// [`call_blocking`] if the gate is open, `Busy` otherwise
    pub async fn call<T, F>(&self, timeout: Duration, f: F) -> PipelineResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> PipelineResult<T> + Send + 'static,
    {
        let permit = Arc::clone(&self.permit)
            .try_acquire_owned()
            .map_err(|_| PipelineError::Busy { modality: self.modality })?;
        call_blocking(self.modality, timeout, move || {
            let _permit = permit;
            f()
        })
        .await
    }
}

/// One gate per adapter and per model
#[derive(Clone, Debug)]
struct CallGates {
    eeg: CallGate,
    camera: CallGate,
    eeg_model: CallGate,
    face_model: CallGate,
}

impl CallGates {
    fn new() -> Self {
        Self {
            eeg: CallGate::new(Modality::Eeg),
            camera: CallGate::new(Modality::Face),
            eeg_model: CallGate::new(Modality::Eeg),
            face_model: CallGate::new(Modality::Face),
        }
    }
}

fn log_call_failure(modality: Modality, stage: &str, err: &PipelineError) {
    match err {
        PipelineError::Busy { .. } => {
            tracing::debug!(%modality, stage, "Previous call still running, skipped");
        }
        PipelineError::Timeout { timeout_ms, .. } => {
            tracing::warn!(%modality, stage, timeout_ms, "External call timed out");
        }
        _ => tracing::warn!(%modality, stage, error = %err, "External call failed"),
    }
}

/// Owns per-subject and per-stream state and runs ticks.
pub struct Orchestrator {
    config: PipelineConfig,
    sensors: Sensors,
    gates: CallGates,
    estimator: QuadrantEstimator,
    smoother: ExpressionSmoother,
    subject_id: String,
    sequence: u64,
    shared: Arc<SharedState>,
}

impl Orchestrator {
    /// Create an orchestrator publishing into `shared`
    pub fn new(config: PipelineConfig, sensors: Sensors, shared: Arc<SharedState>) -> Self {
        Self {
            subject_id: config.initial_subject.clone(),
            config,
            sensors,
            gates: CallGates::new(),
            estimator: QuadrantEstimator::new(),
            smoother: ExpressionSmoother::new(),
            sequence: 0,
            shared,
        }
    }

    /// Pipeline configuration
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Active subject
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Quadrant estimator state, for inspection
    #[must_use]
    pub fn estimator(&self) -> &QuadrantEstimator {
        &self.estimator
    }

    /// Expression smoother state, for inspection
    #[must_use]
    pub fn smoother(&self) -> &ExpressionSmoother {
        &self.smoother
    }

    /// Switch subject: the EEG baseline restarts, the smoother is kept
    pub fn set_active_subject(&mut self, subject_id: String) {
        tracing::info!(from = %self.subject_id, to = %subject_id, "Active subject changed");
        self.subject_id = subject_id;
        self.estimator.reset();
    }

    /// Start both adapters; failures are logged and the stream stays absent
    pub async fn start_sensors(&self) {
        let timeout = self.config.external_call_timeout;
        let eeg = Arc::clone(&self.sensors.eeg);
        let camera = Arc::clone(&self.sensors.camera);
        let (eeg_res, cam_res) = tokio::join!(
            self.gates.eeg.call(timeout, move || eeg.start()),
            self.gates.camera.call(timeout, move || camera.start()),
        );
        if let Err(e) = eeg_res {
            log_call_failure(Modality::Eeg, "start", &e);
        }
        if let Err(e) = cam_res {
            log_call_failure(Modality::Face, "start", &e);
        }
    }

    /// Release both adapters.
    ///
    /// Bypasses the gates: a stuck read must not keep the device open.
    pub async fn stop_sensors(&self) {
        let timeout = self.config.external_call_timeout;
        let eeg = Arc::clone(&self.sensors.eeg);
        let camera = Arc::clone(&self.sensors.camera);
        let (eeg_res, cam_res) = tokio::join!(
            call_blocking(Modality::Eeg, timeout, move || {
                eeg.stop();
                Ok(())
            }),
            call_blocking(Modality::Face, timeout, move || {
                camera.stop();
                Ok(())
            }),
        );
        if let Err(e) = eeg_res {
            log_call_failure(Modality::Eeg, "stop", &e);
        }
        if let Err(e) = cam_res {
            log_call_failure(Modality::Face, "stop", &e);
        }
    }

    /// Acquire, process and publish one tick
    pub async fn tick(&mut self) -> Arc<Snapshot> {
        let readings = self.acquire().await;
        self.apply(readings, Instant::now(), Local::now())
    }

    /// Pull and validate both modalities concurrently.
    ///
    /// The camera gets the last published face expression as overlay hint.
    pub async fn acquire(&self) -> TickReadings {
        let hint = self.shared.snapshot().face_emotion.map_or("none", Expression::name).to_string();
        let (eeg, face) = tokio::join!(self.acquire_eeg(), self.acquire_face(hint));
        TickReadings { eeg, face }
    }

    async fn acquire_eeg(&self) -> Option<EegReading> {
        let timeout = self.config.external_call_timeout;
        let min_samples = self.config.min_eeg_samples;

        let adapter = Arc::clone(&self.sensors.eeg);
        let frame = match self.gates.eeg.call(timeout, move || adapter.raw_buffer(min_samples)).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                log_call_failure(Modality::Eeg, "read", &e);
                return None;
            }
        };

        if let Err(reason) = frame.validate(min_samples, self.config.artifact_limit_uv) {
            tracing::debug!(%reason, "EEG frame rejected");
            return None;
        }
        let raw_sample = frame.latest_centered();
        let channel_activity = frame.channel_activity();

        let model = Arc::clone(&self.sensors.eeg_model);
        match self.gates.eeg_model.call(timeout, move || model.score(&frame)).await {
            Ok(score) => Some(EegReading {
                score: score.sanitized(),
                raw_sample,
                channel_activity,
            }),
            Err(e) => {
                log_call_failure(Modality::Eeg, "score", &e);
                None
            }
        }
    }

    async fn acquire_face(&self, hint: String) -> Option<ExpressionProbs> {
        let timeout = self.config.external_call_timeout;

        let camera = Arc::clone(&self.sensors.camera);
        let region = match self.gates.camera.call(timeout, move || camera.face_region(&hint)).await {
            Ok(Some(region)) => region,
            Ok(None) => return None,
            Err(e) => {
                log_call_failure(Modality::Face, "read", &e);
                return None;
            }
        };

        let model = Arc::clone(&self.sensors.face_model);
        match self.gates.face_model.call(timeout, move || model.score(&region)).await {
            Ok(mut probs) => {
                math::sanitize_probs(&mut probs);
                Some(probs)
            }
            Err(e) => {
                log_call_failure(Modality::Face, "score", &e);
                None
            }
        }
    }

    /// Process acquired readings, publish the snapshot and sample the history.
    ///
    /// `now` gates the history rate limit; `wall` stamps the entry.
    pub fn apply(&mut self, readings: TickReadings, now: Instant, wall: DateTime<Local>) -> Arc<Snapshot> {
        self.sequence += 1;

        let estimate = readings.eeg.map(|reading| {
            let was_calibrated = self.estimator.state().is_calibrated();
            let estimate = self.estimator.estimate(reading.score);
            let state = self.estimator.state();
            if !was_calibrated && state.is_calibrated() {
                tracing::info!(
                    subject = %self.subject_id,
                    center_valence = state.center_valence(),
                    center_arousal = state.center_arousal(),
                    "EEG baseline calibrated"
                );
            }
            (reading, estimate)
        });

        let smoothed = readings.face.and_then(|probs| match math::check_probability_mass(&probs) {
            Ok(_) => Some(self.smoother.smooth(&probs)),
            Err(reason) => {
                tracing::debug!(%reason, "Face reading discarded");
                None
            }
        });

        let fusion = fuse(
            estimate.and_then(|(_, e)| e.label.quadrant()),
            smoothed.as_ref(),
        );
        if fusion.status == FusionStatus::DissonanceDetected {
            tracing::info!(subject = %self.subject_id, "Dissonance detected: social smile over low-valence EEG");
        }

        let mut snapshot = Snapshot::standby(self.subject_id.clone());
        snapshot.sequence = self.sequence;
        snapshot.fusion = fusion;
        if let Some((reading, est)) = estimate {
            snapshot.eeg_emotion = Some(est.label);
            snapshot.eeg_confidence = est.confidence;
            snapshot.eeg_metrics = est.metrics;
            snapshot.eeg_raw_sample = reading.raw_sample.map(sanitize);
            snapshot.eeg_probs = reading.channel_activity.map(sanitize);
        }
        if let Some(face) = &smoothed {
            snapshot.face_emotion = Some(face.dominant);
            snapshot.face_confidence = face.confidence;
        }
        let published = self.shared.publish(snapshot.sanitized());

        if let (Some((_, est)), Some(face)) = (estimate, smoothed) {
            let entry = HistoryEntry {
                timestamp: wall,
                fusion_label: fusion.final_label,
                eeg_label: est.label,
                face_label: face.dominant,
                metrics: est.metrics,
            };
            if self.shared.append_history(entry, now) {
                tracing::trace!(label = fusion.final_label.name(), "History entry appended");
            }
        }

        published
    }
}
