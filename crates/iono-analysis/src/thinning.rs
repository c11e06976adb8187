//! Local-maximum thinning of a grid into a sparse skeleton.
//!
//! One parameterised pass serves both orientations. [`ThinningParams::axis`]
//! names the axis along which a cell must dominate its neighbours; runs of
//! surviving cells are then measured along the orthogonal axis and dropped if
//! shorter than [`ThinningParams::min_run`].
//!
//! | Preset | Suppression axis | Window | Min run |
//! |--------|------------------|--------|---------|
//! | [`ThinningParams::harmonic`] | frequency | ±3 | 16 |
//! | [`ThinningParams::echo`] | delay | ±10 | 6 |
//!
//! The harmonic preset leaves the vertical lines of plasma harmonics; the echo
//! preset leaves the horizontal bands of surface and ionospheric echoes.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::column::{DelayAxis, FrequencyBand};
//! use iono_analysis::grid::Grid;
//! use iono_analysis::thinning::{ThinningParams, thin};
//!
//! // a horizontal band three rows thick
//! let columns = (0..30)
//!     .map(|_| {
//!         (0..20)
//!             .map(|y| match y {
//!                 10 => 2.0,
//!                 9 | 11 => 1.0,
//!                 _ => 0.0,
//!             })
//!             .collect()
//!     })
//!     .collect();
//! let grid = Grid::from_columns("band", columns, FrequencyBand::new(1.0, 2.0), DelayAxis::unit()).unwrap();
//!
//! let skeleton = thin(&grid, &ThinningParams::echo());
//! assert!((0..30).all(|x| skeleton.is_set(x, 10)));
//! assert!((0..30).all(|x| !skeleton.is_set(x, 9)));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Axis, Result};
use crate::grid::Grid;

/// Values at or below this are treated as background.
pub const DEFAULT_NOISE_FLOOR: f32 = 1e-15;

/// Window and run-length constants of one thinning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinningParams {
    /// Axis along which a cell must be a local maximum.
    pub axis: Axis,
    /// Half-width of the suppression window in bins.
    pub window: usize,
    /// Shortest run kept along the orthogonal axis.
    pub min_run: usize,
    /// Background level; cells at or below it never survive.
    pub noise_floor: f32,
}

impl ThinningParams {
    /// Isolates vertical harmonic lines.
    pub const fn harmonic() -> Self {
        Self {
            axis: Axis::Frequency,
            window: 3,
            min_run: 16,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }

    /// Isolates horizontal echo bands.
    pub const fn echo() -> Self {
        Self {
            axis: Axis::Delay,
            window: 10,
            min_run: 6,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

/// Sparse copy of a grid: surviving cells keep their value, the rest are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Skeleton {
    /// Build a skeleton from column-major values.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        if values.len() != width * height {
            return Err(AnalysisError::ShapeMismatch(format!(
                "{} values for a {width}x{height} skeleton",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Skeleton with unit values at `points` (`(x, y)` pairs, out-of-range ignored).
    pub fn from_points(width: usize, height: usize, points: &[(usize, usize)]) -> Result<Self> {
        let mut skeleton = Self::new(width, height, vec![0.0; width * height])?;
        for &(x, y) in points {
            if x < width && y < height {
                skeleton.values[x * height + y] = 1.0;
            }
        }
        Ok(skeleton)
    }

    /// Number of frequency bins.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of delay bins.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[x * self.height + y]
    }

    /// True if `(x, y)` survived thinning.
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.get(x, y) > 0.0
    }

    /// Number of surviving cells.
    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0.0).count()
    }

    /// Column-major values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Thin `grid` with `params`.
pub fn thin(grid: &Grid, params: &ThinningParams) -> Skeleton {
    let (width, height) = (grid.width(), grid.height());
    let mut values = vec![0.0f32; width * height];

    for x in 0..width {
        for y in 0..height {
            let v = grid.get(x, y);
            if v.is_nan() || v <= params.noise_floor {
                continue;
            }
            if is_local_max(grid, x, y, v, params) {
                values[x * height + y] = v;
            }
        }
    }

    remove_short_runs(&mut values, width, height, params.axis.orthogonal(), params.min_run);

    #[cfg(feature = "tracing")]
    tracing::trace!(
        axis = %params.axis,
        kept = values.iter().filter(|&&v| v > 0.0).count(),
        "thinning pass"
    );

    Skeleton {
        width,
        height,
        values,
    }
}

fn is_local_max(grid: &Grid, x: usize, y: usize, v: f32, params: &ThinningParams) -> bool {
    match params.axis {
        Axis::Frequency => {
            let lo = x.saturating_sub(params.window);
            let hi = (x + params.window).min(grid.width() - 1);
            (lo..=hi).all(|xx| grid.get(xx, y) <= v)
        }
        Axis::Delay => {
            let lo = y.saturating_sub(params.window);
            let hi = (y + params.window).min(grid.height() - 1);
            grid.column(x)[lo..=hi].iter().all(|&w| w <= v)
        }
    }
}

/// Zero every run of set cells along `run_axis` shorter than `min_run`.
fn remove_short_runs(values: &mut [f32], width: usize, height: usize, run_axis: Axis, min_run: usize) {
    let (lines, line_len) = match run_axis {
        Axis::Delay => (width, height),
        Axis::Frequency => (height, width),
    };
    let index = |line: usize, pos: usize| match run_axis {
        Axis::Delay => line * height + pos,
        Axis::Frequency => pos * height + line,
    };

    for line in 0..lines {
        let mut start = None;
        for pos in 0..=line_len {
            let set = pos < line_len && values[index(line, pos)] > 0.0;
            match (set, start) {
                (true, None) => start = Some(pos),
                (false, Some(s)) => {
                    if pos - s < min_run {
                        for p in s..pos {
                            values[index(line, p)] = 0.0;
                        }
                    }
                    start = None;
                }
                _ => {}
            }
        }
    }
}
