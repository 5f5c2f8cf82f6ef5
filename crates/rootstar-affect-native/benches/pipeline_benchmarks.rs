//! Benchmarks for the per-tick processing path

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rootstar_affect_core::{fuse, EegScore, ExpressionSmoother, QuadrantEstimator};
use rootstar_affect_native::ml::{BandPowerEegModel, EegModel, EegWindowPreparer};
use rootstar_affect_native::pipeline::{EegReading, Orchestrator, TickReadings};
use rootstar_affect_native::processing::{FourierResampler, SpectralAnalyzer};
use rootstar_affect_native::sensors::RawEegFrame;
use rootstar_affect_native::{PipelineConfig, Sensors, SharedState};

/// Generate synthetic EEG data (sinusoidal with pseudo-noise)
fn generate_eeg_samples(n: usize, freq_hz: f64, sample_rate: f64) -> Vec<f64> {
    use std::f64::consts::PI;

    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let signal = (2.0 * PI * freq_hz * t).sin();
            let noise = (i as f64 * 0.123).sin() * 0.1;
            (signal + noise) * 50.0
        })
        .collect()
}

fn generate_frame(n: usize) -> RawEegFrame {
    let rows = (0..8)
        .map(|ch| generate_eeg_samples(n, 8.0 + ch as f64, 250.0))
        .collect();
    RawEegFrame::new(rows).expect("8 rows")
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for size in [250, 500, 1000].iter() {
        let samples = generate_eeg_samples(*size, 10.0, 250.0);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut resampler = FourierResampler::new(size, 128);
            b.iter(|| black_box(resampler.resample(black_box(&samples))));
        });
    }

    group.finish();
}

fn bench_fft_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_analysis");

    for size in [128, 256, 512].iter() {
        let samples = generate_eeg_samples(*size, 10.0, 250.0);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut analyzer = SpectralAnalyzer::new(size, 250.0);
            b.iter(|| black_box(analyzer.compute_psd(black_box(&samples))));
        });
    }

    group.finish();
}

fn bench_eeg_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("eeg_model");
    let frame = generate_frame(250);

    group.bench_function("prepare_window", |b| {
        let mut preparer = EegWindowPreparer::new(250, 128);
        b.iter(|| black_box(preparer.prepare(black_box(&frame))));
    });

    group.bench_function("band_power_score", |b| {
        let model = BandPowerEegModel::default();
        b.iter(|| black_box(model.score(black_box(&frame))));
    });

    group.finish();
}

fn bench_core_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_step");

    group.bench_function("estimate_smooth_fuse", |b| {
        let mut estimator = QuadrantEstimator::new();
        let mut smoother = ExpressionSmoother::<15>::new();
        let probs = [0.05, 0.05, 0.05, 0.05, 0.5, 0.2, 0.05, 0.05];
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            let v = f64::from(i % 100) / 100.0;
            let est = estimator.estimate(EegScore::new(v, 1.0 - v));
            let face = smoother.smooth(black_box(&probs));
            black_box(fuse(est.label.quadrant(), Some(&face)))
        });
    });

    group.bench_function("orchestrator_apply", |b| {
        let config = PipelineConfig::default();
        let shared = Arc::new(SharedState::new(&config));
        let mut orchestrator = Orchestrator::new(config.clone(), Sensors::simulated(&config), shared);
        let frame = generate_frame(250);
        let readings = TickReadings {
            eeg: Some(EegReading {
                score: EegScore::new(0.6, 0.4),
                raw_sample: frame.latest_centered(),
                channel_activity: frame.channel_activity(),
            }),
            face: Some([0.05, 0.05, 0.05, 0.05, 0.5, 0.2, 0.05, 0.05]),
        };
        let t0 = Instant::now();
        b.iter(|| black_box(orchestrator.apply(readings.clone(), t0, Local::now())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resample,
    bench_fft_analysis,
    bench_eeg_model,
    bench_core_step,
);

criterion_main!(benches);
