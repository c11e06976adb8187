//! Criterion benchmarks for iono-analysis components
//!
//! Run with: cargo bench -p iono-analysis

use std::sync::atomic::AtomicBool;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use iono_analysis::{
    BatchRunner, Column, DelayAxis, Detector, DetectorConfig, EstimatorKind, Frame, FrequencyBand,
    ResampleOptions, Resampler, ThinningParams, WeightTransform, column_sums, extract_peaks, thin,
};

/// Generate an AIS-like frame: uneven frequency table, echo bands and harmonic lines.
fn generate_frame(id: &str) -> Frame {
    let mut state = 0x9e37_79b9u32;
    let mut noise = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 8) as f32 / (1u32 << 24) as f32 * 1e-14
    };

    let columns = (0..160)
        .map(|i| {
            // denser sounding at low frequencies
            let u = i as f64 / 159.0;
            let frequency = 0.1 + 5.4 * u * u.sqrt();
            let samples = (0..80)
                .map(|t| {
                    let echo = if t % 20 == 0 && t > 0 { 1e-12 } else { 0.0 };
                    let harmonic = if i % 12 == 0 && i < 80 { 5e-13 } else { 0.0 };
                    echo + harmonic + noise()
                })
                .collect();
            Column::new(frequency, samples)
        })
        .collect();
    Frame::new(id, columns, DelayAxis::marsis_ais())
}

// ============================================================================
// Resampling benchmarks
// ============================================================================

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resample");

    for &width in &[160usize, 400, 1000] {
        let resampler = Resampler::new(ResampleOptions::marsis_ais().with_size(width, width / 2));
        let frame = generate_frame("bench");

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let grid = resampler.resample(black_box(frame.clone())).unwrap();
                black_box(grid)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Detection benchmarks
// ============================================================================

fn bench_thinning(c: &mut Criterion) {
    let mut group = c.benchmark_group("Thinning");
    let grid = Resampler::new(ResampleOptions::marsis_ais())
        .resample(generate_frame("bench"))
        .unwrap();

    for (name, params) in [("harmonic", ThinningParams::harmonic()), ("echo", ThinningParams::echo())] {
        group.bench_function(name, |b| b.iter(|| black_box(thin(black_box(&grid), &params))));
    }

    group.finish();
}

fn bench_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("Estimator");
    let grid = Resampler::new(ResampleOptions::marsis_ais())
        .resample(generate_frame("bench"))
        .unwrap();
    let profile = column_sums(&grid, None).unwrap();

    for kind in EstimatorKind::ALL {
        let peaks = extract_peaks(&profile, kind.weight_transform());
        group.bench_function(kind.name(), |b| b.iter(|| black_box(kind.estimate(black_box(&peaks)))));
    }

    group.finish();
}

fn bench_extract_peaks(c: &mut Criterion) {
    let grid = Resampler::new(ResampleOptions::marsis_ais())
        .resample(generate_frame("bench"))
        .unwrap();
    let profile = column_sums(&grid, None).unwrap();

    c.bench_function("extract_peaks", |b| {
        b.iter(|| black_box(extract_peaks(black_box(&profile), WeightTransform::Linear)))
    });
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("Detect");
    let grid = Resampler::new(ResampleOptions::marsis_ais())
        .resample(generate_frame("bench"))
        .unwrap();

    for (name, config) in [("thinning", DetectorConfig::default()), ("summing", DetectorConfig::summing())] {
        let detector = Detector::new(config);
        group.bench_function(name, |b| b.iter(|| black_box(detector.detect(black_box(&grid)).unwrap())));
    }

    group.finish();
}

// ============================================================================
// Full pipeline
// ============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch");
    group.sample_size(10);

    let runner = BatchRunner::new(ResampleOptions::marsis_ais(), DetectorConfig::default());
    let cancel = AtomicBool::new(false);

    for &count in &[1usize, 16, 64] {
        let frames: Vec<Frame> = (0..count).map(|i| generate_frame(&format!("f{i}"))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(runner.run(frames.clone(), &cancel)))
        });
    }

    group.finish();
}

fn bench_band_crop(c: &mut Criterion) {
    let grid = Resampler::new(ResampleOptions::marsis_ais().with_band(FrequencyBand::new(0.1, 5.5)))
        .resample(generate_frame("bench"))
        .unwrap();
    c.bench_function("crop_left_half", |b| {
        b.iter(|| black_box(grid.crop_columns(0..grid.width() / 2).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_resample,
    bench_thinning,
    bench_extract_peaks,
    bench_estimators,
    bench_detect,
    bench_batch,
    bench_band_crop,
);

criterion_main!(benches);
