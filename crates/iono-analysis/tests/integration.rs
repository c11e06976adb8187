//! Integration tests for iono-analysis crate.
//!
//! Tests run synthetic frames with known structure through the public API:
//! resampling, both detection strategies, all period estimators, the batch
//! runner and the frame cache.

use std::sync::atomic::AtomicBool;

use iono_analysis::column::AIS_DELAY_BINS;
use iono_analysis::resample::map_to_bin;
use iono_analysis::{
    AnalysisError, Axis, BatchRunner, Column, DelayAxis, DetectionResult, Detector, DetectorConfig,
    EchoKind, EstimatorKind, Frame, FrameCache, FrameId, FrequencyBand, Grid, PeakSequence,
    ResampleOptions, Resampler, compare_results, extract_peaks,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const COLUMNS: usize = 160;

/// Sounding frequency of column `i`, evenly spread over the AIS band.
fn ais_frequency(i: usize) -> f64 {
    let band = FrequencyBand::marsis_ais();
    band.min + i as f64 * band.range() / (COLUMNS - 1) as f64
}

/// A 160 x 80 AIS-shaped frame whose delay series come from `f(column, bin)`.
fn ais_frame(id: &str, f: impl Fn(usize, usize) -> f32) -> Frame {
    let columns = (0..COLUMNS)
        .map(|i| Column::new(ais_frequency(i), (0..AIS_DELAY_BINS).map(|t| f(i, t)).collect()))
        .collect();
    Frame::new(id, columns, DelayAxis::marsis_ais())
}

/// Resampler that maps AIS frames one-to-one onto a 160 x 80 grid.
fn ais_resampler() -> Resampler {
    Resampler::new(ResampleOptions::marsis_ais().with_size(COLUMNS, AIS_DELAY_BINS))
}

/// Horizontal echo bands at the given delay bins.
fn echo_bands(id: &str, rows: &'static [usize]) -> Frame {
    ais_frame(id, move |_, t| if rows.contains(&t) { 2.0 } else { 0.0 })
}

/// Grid with full-height vertical lines at the given columns.
fn harmonic_grid(lines: &[usize]) -> Grid {
    let columns = (0..COLUMNS)
        .map(|x| vec![if lines.contains(&x) { 1.0 } else { 0.0 }; AIS_DELAY_BINS])
        .collect();
    Grid::from_columns("harmonics", columns, FrequencyBand::marsis_ais(), DelayAxis::marsis_ais()).unwrap()
}

// ===========================================================================
// 1. Resampling
// ===========================================================================

#[test]
fn resample_keeps_echo_row_in_place() {
    let frame = ais_frame("spike", |_, t| if t == 40 { 1.0 } else { 0.0 });
    let grid = ais_resampler().resample(frame).unwrap();

    assert_eq!((grid.width(), grid.height()), (160, 80));
    let ridge = map_to_bin(40.0, 0.0, 79.0, grid.height());
    assert_eq!(ridge, 40);
    for x in 0..grid.width() {
        assert_eq!(grid.get(x, ridge), 1.0, "column {x}");
        assert_eq!(grid.get(x, ridge - 1), 0.0);
        assert_eq!(grid.get(x, ridge + 1), 0.0);
    }
}

/// Spike at bin 40 in 160 columns spread over 100 Hz .. 5.5 MHz, grid size
/// left to the resampler.
#[test]
fn resample_derived_size_keeps_ridge_row() {
    let columns = (0..COLUMNS)
        .map(|i| {
            let frequency = 100.0 + i as f64 * (5_500_000.0 - 100.0) / (COLUMNS - 1) as f64;
            let samples = (0..AIS_DELAY_BINS).map(|t| if t == 40 { 1.0 } else { 0.0 }).collect();
            Column::new(frequency, samples)
        })
        .collect();
    let frame = Frame::new("round-trip", columns, DelayAxis::marsis_ais());
    let grid = Resampler::default().resample(frame).unwrap();

    assert!(grid.width() >= 1 && grid.width() <= ResampleOptions::default().max_samples);
    assert_eq!(grid.height(), (grid.width() / 2).max(1));

    let ridge = map_to_bin(40.0, 0.0, (AIS_DELAY_BINS - 1) as f64, grid.height());
    let on_ridge = (0..grid.width())
        .filter(|&x| {
            let column = grid.column(x);
            let strongest = column
                .iter()
                .enumerate()
                .fold(0, |best, (y, &v)| if v > column[best] { y } else { best });
            strongest == ridge
        })
        .count();
    assert!(
        on_ridge * 20 >= grid.width() * 19,
        "ridge row {ridge} strongest in {on_ridge}/{} columns",
        grid.width()
    );
}

#[test]
fn resample_fills_gaps_between_sparse_columns() {
    // every fourth column measured, constant intensity
    let columns = (0..COLUMNS)
        .step_by(4)
        .map(|i| Column::new(ais_frequency(i), vec![1.0; AIS_DELAY_BINS]))
        .collect();
    let frame = Frame::new("sparse", columns, DelayAxis::marsis_ais());
    let grid = ais_resampler().resample(frame).unwrap();

    assert!(grid.stats().max <= 1.0 + 1e-6);
    for x in 0..156 {
        let v = grid.get(x, 10);
        if x % 4 == 0 {
            assert_eq!(v, 1.0, "measured column {x}");
        } else {
            // blended along frequency, nothing along delay in an empty column
            assert!((v - 0.5).abs() < 1e-6, "column {x}: {v}");
        }
    }
    // past the last measured column the estimate decays
    assert!(grid.get(157, 10) > grid.get(159, 10));
    assert!(grid.get(159, 10) > 0.0);
}

#[test]
fn resample_reports_malformed_frames() {
    let resampler = Resampler::default();

    let empty = Frame::new("empty", Vec::new(), DelayAxis::unit());
    assert_eq!(resampler.resample(empty), Err(AnalysisError::EmptyFrame));

    let ragged = Frame::new(
        "ragged",
        vec![Column::new(1.0, vec![0.0; 4]), Column::new(2.0, vec![0.0; 5])],
        DelayAxis::unit(),
    );
    assert!(matches!(
        resampler.resample(ragged),
        Err(AnalysisError::ColumnLengthMismatch { index: 1, .. })
    ));

    let flat = Frame::new(
        "flat",
        vec![Column::new(2.0, vec![0.0; 4]), Column::new(2.0, vec![0.0; 4])],
        DelayAxis::unit(),
    );
    assert!(resampler.resample(flat).is_err());
}

#[test]
fn grid_position_round_trips_physical_keys() {
    let grid = ais_resampler().resample(ais_frame("keys", |_, _| 0.0)).unwrap();
    for x in [0, 17, 80, 159] {
        for y in [0, 33, 79] {
            let p = grid.physical(iono_analysis::GridPoint::new(x, y));
            let back = grid.position(p.delay, p.frequency).unwrap();
            assert_eq!((back.x, back.y), (x, y));
        }
    }
    assert!(matches!(
        grid.position(-1.0, 1.0),
        Err(AnalysisError::KeyOutOfRange { axis: Axis::Delay, .. })
    ));
}

// ===========================================================================
// 2. Period estimators
// ===========================================================================

#[test]
fn every_estimator_finds_regular_spacing() {
    let idx: Vec<usize> = (5..200).step_by(10).collect();
    let seq = PeakSequence::from_indices(200, &idx);
    for kind in EstimatorKind::ALL {
        let est = kind.estimate(&seq).unwrap();
        assert!(
            (est.period - 10.0).abs() <= 1.0,
            "{} estimated {}",
            kind.name(),
            est.period
        );
    }
}

#[test]
fn harmonic_column_profile_has_period_twenty() {
    let grid = harmonic_grid(&[10, 30, 50, 70, 90, 110, 130, 150]);
    let profile = iono_analysis::column_sums(&grid, None).unwrap();
    let peaks = extract_peaks(&profile, EstimatorKind::Periodogram.weight_transform());
    assert_eq!(peaks.count(), 8);

    let periodogram = EstimatorKind::Periodogram.estimate(&peaks).unwrap();
    assert!((periodogram.period - 20.0).abs() <= 1.0, "{}", periodogram.period);

    let trimmed = EstimatorKind::QuantileDistance.estimate(&peaks).unwrap();
    assert!((trimmed.period - 20.0).abs() < 1e-9);
}

#[test]
fn missed_peak_does_not_double_the_period() {
    // the peak at 50 is missing; one distance is 40
    let seq = PeakSequence::from_indices(160, &[10, 30, 70, 90, 110, 130]);
    let est = EstimatorKind::QuantileDistance.estimate(&seq).unwrap();
    assert!((est.period - 20.0).abs() < 1e-9);
}

// ===========================================================================
// 3. Detection
// ===========================================================================

#[test]
fn thinning_finds_harmonic_lines() {
    let grid = harmonic_grid(&[10, 30, 50, 70, 90, 110, 130, 150]);
    let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();

    let h = result.horizontal_period.as_ref().unwrap();
    assert_eq!(h.axis, Axis::Frequency);
    assert!((h.period_bins - 20.0).abs() <= 1.0, "{}", h.period_bins);
    assert!((h.period - h.period_bins * grid.bin_size(Axis::Frequency)).abs() < 1e-12);
    assert_eq!((h.first_bin, h.last_bin), (10, 70));

    // vertical lines leave no horizontal echo runs
    assert!(result.vertical_period.is_none());
    assert!(result.ground_trace.is_none());
    assert!(result.ionospheric_trace.is_none());
}

#[test]
fn thinning_finds_echo_bands_and_traces() {
    let grid = ais_resampler().resample(echo_bands("echoes", &[20, 40, 60])).unwrap();
    let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();

    let v = result.vertical_period.as_ref().unwrap();
    assert_eq!(v.axis, Axis::Delay);
    assert_eq!(v.estimator, Some(EstimatorKind::QuantileDistance));
    assert!((v.period_bins - 20.0).abs() < 1e-9);
    assert_eq!((v.first_bin, v.last_bin), (20, 60));

    let ground = result.ground_trace.as_ref().unwrap();
    assert_eq!(ground.kind, EchoKind::Ground);
    assert_eq!(ground.len(), 80);
    assert!(ground.points.iter().all(|p| p.y == 20 && p.x >= 80));

    let iono = result.ionospheric_trace.as_ref().unwrap();
    assert_eq!(iono.len(), 80);
    assert!(iono.points.windows(2).all(|w| w[0].x < w[1].x));
    assert!(iono.points.iter().all(|p| p.x < 80));

    assert!(result.horizontal_period.is_none());
    assert_eq!(result.feature_count(), 3);
}

#[test]
fn lone_lower_echo_is_its_own_period() {
    let grid = ais_resampler().resample(echo_bands("deep", &[50])).unwrap();
    let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
    let v = result.vertical_period.unwrap();
    assert_eq!(v.estimator, None);
    assert_eq!(v.period_bins, 50.0);
}

#[test]
fn lone_upper_echo_has_no_period() {
    let grid = ais_resampler().resample(echo_bands("shallow", &[12])).unwrap();
    let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
    assert!(result.vertical_period.is_none());
}

#[test]
fn summing_strategy_uses_profiles() {
    let grid = harmonic_grid(&[10, 30, 50, 70, 90, 110, 130, 150]);
    let result = Detector::new(DetectorConfig::summing()).detect(&grid).unwrap();

    let h = result.horizontal_period.unwrap();
    assert!((h.period_bins - 20.0).abs() <= 1.0, "{}", h.period_bins);
    // rows are identical, so the delay profile is a single plateau
    assert!(result.vertical_period.is_none());
    assert!(result.ground_trace.is_none() && result.ionospheric_trace.is_none());
}

#[test]
fn strategies_agree_on_harmonic_period() {
    let grid = harmonic_grid(&[10, 30, 50, 70, 90, 110, 130, 150]);
    let thinning = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
    let summing = Detector::new(DetectorConfig::summing()).detect(&grid).unwrap();

    let cmp = compare_results(&thinning, &summing);
    let h = cmp.horizontal.unwrap();
    assert_eq!(h.multiple, 1);
    assert!(h.difference.abs() <= 2.0 * grid.bin_size(Axis::Frequency));
    assert!(cmp.vertical.is_none());
}

#[test]
fn result_survives_json() {
    let grid = ais_resampler().resample(echo_bands("json", &[20, 40, 60])).unwrap();
    let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
    let json = serde_json::to_string_pretty(&result).unwrap();
    let back: DetectionResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.frame, result.frame);
    assert_eq!((back.width, back.height), (result.width, result.height));
    let (v, w) = (back.vertical_period.unwrap(), result.vertical_period.unwrap());
    assert!((v.period - w.period).abs() < 1e-12);
    assert_eq!(v.estimator, w.estimator);
    assert_eq!(
        back.ground_trace.unwrap().points,
        result.ground_trace.unwrap().points
    );
    assert!(back.horizontal_period.is_none());
    assert!(json.contains("\"estimator\": \"quantile_distance\""));
}

// ===========================================================================
// 4. Batch and cache
// ===========================================================================

#[test]
fn batch_runs_every_frame_in_order() {
    let frames: Vec<Frame> = (0..6)
        .map(|i| echo_bands(&format!("orbit-{i:04}"), &[20, 40, 60]))
        .collect();
    let runner = BatchRunner::new(
        ResampleOptions::marsis_ais().with_size(COLUMNS, AIS_DELAY_BINS),
        DetectorConfig::default(),
    );
    let results = runner.run(frames, &AtomicBool::new(false));

    assert_eq!(results.len(), 6);
    for (i, r) in results.into_iter().enumerate() {
        let r = r.unwrap();
        assert_eq!(r.frame, FrameId::new(format!("orbit-{i:04}")));
        assert!((r.vertical_period.unwrap().period_bins - 20.0).abs() < 1e-9);
    }
}

#[test]
fn cancelled_batch_starts_nothing() {
    let frames = vec![echo_bands("a", &[20]), echo_bands("b", &[20])];
    let results = BatchRunner::default().run(frames, &AtomicBool::new(true));
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(AnalysisError::Cancelled(_))))
    );
}

#[test]
fn cache_serves_resampled_grids() {
    let resampler = ais_resampler();
    let mut cache: FrameCache<Grid> = FrameCache::new(2);
    let id = FrameId::from("cached");

    let mut loads = 0;
    for _ in 0..3 {
        let grid = cache
            .get_or_try_insert_with(&id, || {
                loads += 1;
                resampler.resample(echo_bands("cached", &[30]))
            })
            .unwrap();
        assert_eq!(grid.id(), &id);
    }
    assert_eq!(loads, 1);
    assert_eq!(cache.stats().hits, 2);
}
