//! Feature detection pipeline: grid in, [`DetectionResult`] out.
//!
//! Two strategies are available.
//!
//! ## Thinning (default)
//!
//! - **Horizontal period**: the low-frequency half of the grid is thinned with
//!   [`ThinningParams::harmonic`]. Per-column support (set cells) and strength
//!   (sum of set values) are computed; weak columns are merged into a stronger
//!   column up to `smoothing_length` bins to their right; short columns that do
//!   not reach the top rows are dropped. The remaining columns are equally
//!   flagged peaks weighted by strength.
//! - **Vertical period**: the whole grid is thinned with
//!   [`ThinningParams::echo`]. A row is an echo candidate if it is set in
//!   column 0 and exceeds the echo floor somewhere in the leftmost strip.
//!   No candidates, or more than half the height, mean no period. A first
//!   echo in the lower half is itself the period. A lone echo in the upper
//!   half is rejected. Otherwise the echoes are equally weighted peaks.
//! - **Traces**: the ground echo is traced over the high-frequency half and
//!   the ionospheric echo over the low-frequency half of the echo skeleton.
//!
//! ## Summing
//!
//! Column sums of the whole grid and row sums of its low-frequency half go
//! through [`extract_peaks`] and the configured estimators. No traces are
//! produced.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::column::{DelayAxis, FrequencyBand};
//! use iono_analysis::detect::{Detector, DetectorConfig};
//! use iono_analysis::grid::Grid;
//!
//! let grid = Grid::empty("quiet", 160, 80, FrequencyBand::marsis_ais(), DelayAxis::marsis_ais()).unwrap();
//! let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
//! assert_eq!(result.feature_count(), 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::{column_sums, row_sums};
use crate::error::{Axis, Result};
use crate::grid::Grid;
use crate::peaks::{PeakSequence, WeightTransform, extract_peaks};
use crate::period::{EstimatorKind, PeriodEstimate};
use crate::result::{DetectionResult, EchoKind, EchoTrace, PeriodFeature};
use crate::thinning::{Skeleton, ThinningParams, thin};
use crate::trace::{TraceSettings, trace};

/// How features are located in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Skeleton-based periods and echo traces.
    #[default]
    Thinning,
    /// Row and column sum periods only.
    Summing,
}

/// Calibration of harmonic line selection on the harmonic skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonicLineSettings {
    /// How far right a column may be merged into a stronger neighbour.
    pub smoothing_length: usize,
    /// Columns with fewer set cells are dropped unless they reach the top rows.
    pub min_support: usize,
    /// Number of top rows that exempt a short column from removal.
    pub top_rows: usize,
}

impl Default for HarmonicLineSettings {
    fn default() -> Self {
        Self {
            smoothing_length: 4,
            min_support: 20,
            top_rows: 4,
        }
    }
}

/// Calibration of echo row selection on the echo skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoLineSettings {
    /// Width of the leftmost strip an echo must be visible in.
    pub strip_width: usize,
    /// Value an echo must exceed somewhere in the strip.
    pub echo_floor: f32,
}

impl Default for EchoLineSettings {
    fn default() -> Self {
        Self {
            strip_width: 20,
            echo_floor: 2e-15,
        }
    }
}

/// Full parameter set of a [`Detector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detection strategy.
    pub strategy: DetectionStrategy,
    /// Estimator for the frequency-axis period.
    pub horizontal_estimator: EstimatorKind,
    /// Estimator for the delay-axis period.
    pub vertical_estimator: EstimatorKind,
    /// Thinning used for the horizontal period.
    pub harmonic_thinning: ThinningParams,
    /// Thinning used for the vertical period and the traces.
    pub echo_thinning: ThinningParams,
    /// Harmonic column selection.
    pub harmonic_lines: HarmonicLineSettings,
    /// Echo row selection.
    pub echo_lines: EchoLineSettings,
    /// Ionospheric trace tunables (low-frequency half).
    pub ionospheric_trace: TraceSettings,
    /// Ground trace tunables (high-frequency half).
    pub ground_trace: TraceSettings,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::Thinning,
            horizontal_estimator: EstimatorKind::Periodogram,
            vertical_estimator: EstimatorKind::QuantileDistance,
            harmonic_thinning: ThinningParams::harmonic(),
            echo_thinning: ThinningParams::echo(),
            harmonic_lines: HarmonicLineSettings::default(),
            echo_lines: EchoLineSettings::default(),
            ionospheric_trace: TraceSettings::ionospheric(),
            ground_trace: TraceSettings::ground(),
        }
    }
}

impl DetectorConfig {
    /// Row/column sum detection with the periodogram on both axes.
    pub fn summing() -> Self {
        Self {
            strategy: DetectionStrategy::Summing,
            vertical_estimator: EstimatorKind::Periodogram,
            ..Self::default()
        }
    }
}

/// Runs the configured detection strategy on grids.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    /// Create a detector.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect every feature the strategy supports.
    pub fn detect(&self, grid: &Grid) -> Result<DetectionResult> {
        let mut result = DetectionResult::empty(grid);
        match self.config.strategy {
            DetectionStrategy::Thinning => {
                result.horizontal_period = self.skeleton_horizontal_period(grid)?;
                let echoes = thin(grid, &self.config.echo_thinning);
                result.vertical_period = self.skeleton_vertical_period(grid, &echoes);
                result.ground_trace = self.trace_echo(grid, &echoes, EchoKind::Ground)?;
                result.ionospheric_trace = self.trace_echo(grid, &echoes, EchoKind::Ionospheric)?;
            }
            DetectionStrategy::Summing => {
                result.horizontal_period = self.summed_period(grid, Axis::Frequency)?;
                result.vertical_period = self.summed_period(grid, Axis::Delay)?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            frame = %grid.id(),
            strategy = ?self.config.strategy,
            features = result.feature_count(),
            "detection finished"
        );

        Ok(result)
    }

    /// Period of the sum profile along `axis`.
    ///
    /// Row sums (delay axis) only cover the low-frequency half.
    pub fn summed_period(&self, grid: &Grid, axis: Axis) -> Result<Option<PeriodFeature>> {
        let (profile, estimator) = match axis {
            Axis::Frequency => (column_sums(grid, None)?, self.config.horizontal_estimator),
            Axis::Delay => (
                row_sums(grid, Some(0..left_half(grid.width())))?,
                self.config.vertical_estimator,
            ),
        };
        let peaks = extract_peaks(&profile, estimator.weight_transform());
        Ok(estimate_feature(grid, axis, estimator, &peaks))
    }

    /// Horizontal period from the harmonic skeleton of the low-frequency half.
    pub fn skeleton_horizontal_period(&self, grid: &Grid) -> Result<Option<PeriodFeature>> {
        let left = grid.crop_columns(0..left_half(grid.width()))?;
        let skeleton = thin(&left, &self.config.harmonic_thinning);
        let estimator = self.config.horizontal_estimator;
        let Some(peaks) = harmonic_lines(&skeleton, &self.config.harmonic_lines, estimator.weight_transform())
        else {
            return Ok(None);
        };
        Ok(estimate_feature(grid, Axis::Frequency, estimator, &peaks))
    }

    /// Vertical period from echo rows visible at the low-frequency edge.
    pub fn skeleton_vertical_period(&self, grid: &Grid, echoes: &Skeleton) -> Option<PeriodFeature> {
        let settings = &self.config.echo_lines;
        let strip = settings.strip_width.min(echoes.width());
        let rows: Vec<usize> = (0..echoes.height())
            .filter(|&y| echoes.is_set(0, y))
            .filter(|&y| (0..strip).any(|x| echoes.get(x, y) > settings.echo_floor))
            .collect();

        let height = echoes.height();
        let &first = rows.first()?;
        let &last = rows.last()?;
        if rows.len() > height / 2 {
            return None;
        }
        if first > height / 2 {
            // a single line in the lower half; its delay is the period
            return Some(PeriodFeature::from_estimate(
                grid,
                Axis::Delay,
                None,
                PeriodEstimate::unanchored(first as f64),
                first,
                first,
            ));
        }
        if rows.len() == 1 {
            return None;
        }

        let peaks = PeakSequence::from_indices(height, &rows);
        let estimator = self.config.vertical_estimator;
        let mut feature = estimate_feature(grid, Axis::Delay, estimator, &peaks)?;
        feature.first_bin = first;
        feature.last_bin = last;
        Some(feature)
    }

    /// Trace the ground or ionospheric echo on the echo skeleton.
    pub fn trace_echo(&self, grid: &Grid, echoes: &Skeleton, kind: EchoKind) -> Result<Option<EchoTrace>> {
        let width = echoes.width();
        let (columns, settings) = match kind {
            EchoKind::Ground => (width / 2..width, &self.config.ground_trace),
            EchoKind::Ionospheric => (0..width / 2, &self.config.ionospheric_trace),
        };
        let points = trace(echoes, columns, settings)?;
        Ok(points.map(|p| EchoTrace::new(grid, kind, p)))
    }
}

/// Width of the low-frequency half, at least one column.
fn left_half(width: usize) -> usize {
    (width / 2).max(1).min(width)
}

/// Run `estimator` on `peaks` and convert the result to physical units.
fn estimate_feature(
    grid: &Grid,
    axis: Axis,
    estimator: EstimatorKind,
    peaks: &PeakSequence,
) -> Option<PeriodFeature> {
    let indices = peaks.indices();
    let (&first, &last) = (indices.first()?, indices.last()?);
    let estimate = estimator.estimate(peaks)?;
    if !(estimate.period.is_finite() && estimate.period > 0.0) {
        return None;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        axis = %axis,
        estimator = estimator.name(),
        period = estimate.period,
        "period estimated"
    );

    Some(PeriodFeature::from_estimate(
        grid,
        axis,
        Some(estimator),
        estimate,
        first,
        last,
    ))
}

/// Weighted harmonic line positions of a harmonic skeleton.
///
/// `None` when no column survives selection.
pub fn harmonic_lines(
    skeleton: &Skeleton,
    settings: &HarmonicLineSettings,
    transform: WeightTransform,
) -> Option<PeakSequence> {
    let (width, height) = (skeleton.width(), skeleton.height());
    let mut sums = vec![0.0f64; width];
    let mut counts = vec![0usize; width];
    for x in 0..width {
        for y in 0..height {
            let v = skeleton.get(x, y);
            if v > 0.0 {
                sums[x] += v as f64;
                counts[x] += 1;
            }
        }
    }

    let smoothing = settings.smoothing_length;
    for x in 0..width.saturating_sub(smoothing) {
        if sums[x] <= 0.0 {
            continue;
        }
        if let Some(target) = (1..=smoothing).map(|i| x + i).find(|&t| sums[t] > sums[x]) {
            sums[target] += sums[x];
            counts[target] += counts[x];
            sums[x] = 0.0;
            counts[x] = 0;
        }
    }

    let top = settings.top_rows.min(height);
    let mut peaks = vec![0.0; width];
    let mut weights = vec![0.0; width];
    for x in 0..width {
        if counts[x] == 0 {
            continue;
        }
        let reaches_top = (0..top).any(|y| skeleton.is_set(x, y));
        if counts[x] < settings.min_support && !reaches_top {
            continue;
        }
        peaks[x] = 1.0;
        weights[x] = match transform {
            WeightTransform::Linear => sums[x],
            WeightTransform::Sqrt => sums[x].sqrt(),
        };
    }

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    for w in &mut weights {
        *w /= total;
    }
    PeakSequence::new(peaks, weights).ok()
}
