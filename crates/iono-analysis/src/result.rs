//! Detection results and their comparison.
//!
//! A [`DetectionResult`] is terminal: it holds the source frame's identity,
//! the grid's shape and axes, and the detected features in both bin and
//! physical units. It never references the grid's sample data, so results of
//! a long batch can be retained while grids are dropped.

use serde::{Deserialize, Serialize};

use crate::column::{DelayAxis, FrameId, FrequencyBand};
use crate::error::Axis;
use crate::grid::{Grid, GridPoint, GridStats, PhysicalPoint};
use crate::period::{EstimatorKind, PeriodEstimate};

/// A repetition detected along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFeature {
    /// Axis along which the pattern repeats.
    pub axis: Axis,
    /// Strategy that produced the estimate; `None` for rule-based periods.
    pub estimator: Option<EstimatorKind>,
    /// Period in bins.
    pub period_bins: f64,
    /// Period in physical units of the axis (MHz or ms for AIS data).
    pub period: f64,
    /// Phase anchor in bins, if the estimator constrains phase.
    pub offset: Option<i64>,
    /// Bin of the first contributing peak.
    pub first_bin: usize,
    /// Bin of the last contributing peak.
    pub last_bin: usize,
}

impl PeriodFeature {
    /// Convert a bin-unit estimate using `grid`'s axis scale.
    pub fn from_estimate(
        grid: &Grid,
        axis: Axis,
        estimator: Option<EstimatorKind>,
        estimate: PeriodEstimate,
        first_bin: usize,
        last_bin: usize,
    ) -> Self {
        Self {
            axis,
            estimator,
            period_bins: estimate.period,
            period: estimate.period * grid.bin_size(axis),
            offset: estimate.offset,
            first_bin,
            last_bin,
        }
    }
}

/// Which physical echo a trace follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoKind {
    /// Reflection from the ionosphere.
    Ionospheric,
    /// Reflection from the planetary surface.
    Ground,
}

/// Ordered ridge points, strictly increasing in frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoTrace {
    /// Echo the trace belongs to.
    pub kind: EchoKind,
    /// Grid cells of the ridge.
    pub points: Vec<GridPoint>,
    /// The same cells in physical units.
    pub physical: Vec<PhysicalPoint>,
}

impl EchoTrace {
    /// Build a trace from grid cells, converting them with `grid`'s axes.
    pub fn new(grid: &Grid, kind: EchoKind, points: Vec<GridPoint>) -> Self {
        let physical = points.iter().map(|&p| grid.physical(p)).collect();
        Self {
            kind,
            points,
            physical,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the trace has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything detected on one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Source frame.
    pub frame: FrameId,
    /// Grid width in frequency bins.
    pub width: usize,
    /// Grid height in delay bins.
    pub height: usize,
    /// Frequency band of the grid.
    pub band: FrequencyBand,
    /// Delay axis of the grid rows.
    pub delay: DelayAxis,
    /// Summary statistics of the grid.
    pub stats: GridStats,
    /// Repetition along the frequency axis (plasma oscillation harmonics).
    pub horizontal_period: Option<PeriodFeature>,
    /// Repetition along the delay axis (cyclotron echoes).
    pub vertical_period: Option<PeriodFeature>,
    /// Ionospheric echo ridge.
    pub ionospheric_trace: Option<EchoTrace>,
    /// Ground echo ridge.
    pub ground_trace: Option<EchoTrace>,
}

impl DetectionResult {
    /// A result with no features for `grid`.
    pub fn empty(grid: &Grid) -> Self {
        Self {
            frame: grid.id().clone(),
            width: grid.width(),
            height: grid.height(),
            band: grid.band(),
            delay: grid.delay_axis(),
            stats: grid.stats(),
            horizontal_period: None,
            vertical_period: None,
            ionospheric_trace: None,
            ground_trace: None,
        }
    }

    /// Number of detected features.
    pub fn feature_count(&self) -> usize {
        usize::from(self.horizontal_period.is_some())
            + usize::from(self.vertical_period.is_some())
            + usize::from(self.ionospheric_trace.is_some())
            + usize::from(self.ground_trace.is_some())
    }
}

/// Agreement of two period estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    /// `a - b`.
    pub difference: f64,
    /// The larger period.
    pub larger: f64,
    /// How many times the smaller period fits into the larger one.
    pub multiple: u32,
    /// `larger - multiple * smaller`; near zero when one is a multiple of the other.
    pub residual: f64,
}

/// Compare two periods, `None` unless both are positive and finite.
pub fn compare_periods(a: f64, b: f64) -> Option<PeriodComparison> {
    if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
        return None;
    }
    let (larger, smaller) = if a >= b { (a, b) } else { (b, a) };
    let multiple = (larger / smaller).floor();
    Some(PeriodComparison {
        difference: a - b,
        larger,
        multiple: multiple as u32,
        residual: larger - multiple * smaller,
    })
}

/// Horizontal and vertical period comparisons of two results for the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultComparison {
    /// Comparison of the horizontal periods.
    pub horizontal: Option<PeriodComparison>,
    /// Comparison of the vertical periods.
    pub vertical: Option<PeriodComparison>,
}

/// Compare the physical periods of two results.
pub fn compare_results(a: &DetectionResult, b: &DetectionResult) -> ResultComparison {
    let pair = |x: &Option<PeriodFeature>, y: &Option<PeriodFeature>| match (x, y) {
        (Some(x), Some(y)) => compare_periods(x.period, y.period),
        _ => None,
    };
    ResultComparison {
        horizontal: pair(&a.horizontal_period, &b.horizontal_period),
        vertical: pair(&a.vertical_period, &b.vertical_period),
    }
}
