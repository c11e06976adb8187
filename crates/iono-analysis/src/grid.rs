//! Evenly sampled ionogram grid.
//!
//! A [`Grid`] is a dense `width x height` array of echo intensities indexed by
//! frequency bin `x` and delay bin `y`. Storage is column-major: the delay
//! series of one frequency bin is contiguous, matching how frames are measured.
//!
//! Both axes are uniform. Column `x` sits at frequency
//! `band.min + x * band.range() / (width - 1)`, row `y` at delay
//! `delay.min + y * delay.bin_width`.
//!
//! Cells without data hold [`NO_DATA`].

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::column::{DelayAxis, FrameId, FrequencyBand};
use crate::error::{AnalysisError, Axis, Result};

/// Value of a cell that received no measurement and no interpolated estimate.
pub const NO_DATA: f32 = 0.0;

/// Integer cell coordinates: `x` is the frequency bin, `y` the delay bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Frequency bin.
    pub x: usize,
    /// Delay bin.
    pub y: usize,
}

impl GridPoint {
    /// Create a point.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A cell position in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPoint {
    /// Frequency of the cell's column.
    pub frequency: f64,
    /// Delay of the cell's row.
    pub delay: f64,
}

/// Summary statistics over every cell of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Largest cell value.
    pub max: f64,
}

/// Evenly sampled 2D intensity array with physical axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    id: FrameId,
    width: usize,
    height: usize,
    data: Vec<f32>,
    column_keys: Vec<f64>,
    band: FrequencyBand,
    delay: DelayAxis,
}

impl Grid {
    /// Build a grid from column-major data (`data[x * height + y]`).
    pub fn new(
        id: impl Into<FrameId>,
        width: usize,
        height: usize,
        data: Vec<f32>,
        band: FrequencyBand,
        delay: DelayAxis,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        if data.len() != width * height {
            return Err(AnalysisError::ShapeMismatch(format!(
                "{} cells for a {width}x{height} grid",
                data.len()
            )));
        }
        band.validate()?;

        let step = if width > 1 {
            band.range() / (width - 1) as f64
        } else {
            0.0
        };
        let column_keys = (0..width).map(|x| band.min + x as f64 * step).collect();

        Ok(Self {
            id: id.into(),
            width,
            height,
            data,
            column_keys,
            band,
            delay,
        })
    }

    /// Build a grid from one `Vec` per frequency bin.
    pub fn from_columns(
        id: impl Into<FrameId>,
        columns: Vec<Vec<f32>>,
        band: FrequencyBand,
        delay: DelayAxis,
    ) -> Result<Self> {
        let width = columns.len();
        let height = columns.first().map_or(0, Vec::len);
        if let Some(index) = columns.iter().position(|c| c.len() != height) {
            return Err(AnalysisError::ColumnLengthMismatch {
                index,
                expected: height,
                found: columns[index].len(),
            });
        }
        let data = columns.into_iter().flatten().collect();
        Self::new(id, width, height, data, band, delay)
    }

    /// A grid filled with [`NO_DATA`].
    pub fn empty(
        id: impl Into<FrameId>,
        width: usize,
        height: usize,
        band: FrequencyBand,
        delay: DelayAxis,
    ) -> Result<Self> {
        Self::new(id, width, height, vec![NO_DATA; width * height], band, delay)
    }

    /// Identity of the source frame.
    pub fn id(&self) -> &FrameId {
        &self.id
    }

    /// Number of frequency bins.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of delay bins.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Length of the given axis.
    pub fn len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Frequency => self.width,
            Axis::Delay => self.height,
        }
    }

    /// Cell value. Panics if out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.data[x * self.height + y]
    }

    /// Overwrite a cell. Panics if out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        debug_assert!(x < self.width && y < self.height);
        self.data[x * self.height + y] = value;
    }

    /// Delay series of frequency bin `x`.
    pub fn column(&self, x: usize) -> &[f32] {
        &self.data[x * self.height..(x + 1) * self.height]
    }

    /// Raw column-major storage.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Frequency of every column, strictly increasing.
    pub fn column_keys(&self) -> &[f64] {
        &self.column_keys
    }

    /// Frequency band spanned by the columns.
    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    /// Delay scale of the rows.
    pub fn delay_axis(&self) -> DelayAxis {
        self.delay
    }

    /// Frequency of column `x`.
    pub fn frequency_at(&self, x: usize) -> f64 {
        self.column_keys[x]
    }

    /// Delay of row `y`.
    pub fn delay_at(&self, y: usize) -> f64 {
        self.delay.delay_at(y)
    }

    /// Lowest column frequency.
    pub fn min_frequency(&self) -> f64 {
        self.band.min
    }

    /// Highest column frequency.
    pub fn max_frequency(&self) -> f64 {
        self.band.max
    }

    /// Frequency span of the grid.
    pub fn frequency_range(&self) -> f64 {
        self.band.range()
    }

    /// Delay of the first row.
    pub fn min_delay(&self) -> f64 {
        self.delay.min
    }

    /// Delay of the last row.
    pub fn max_delay(&self) -> f64 {
        self.delay.max_for(self.height)
    }

    /// Delay span of the grid.
    pub fn delay_range(&self) -> f64 {
        self.max_delay() - self.min_delay()
    }

    /// Physical distance between adjacent bins of `axis`.
    pub fn bin_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Frequency if self.width > 1 => self.band.range() / (self.width - 1) as f64,
            Axis::Frequency => self.band.range(),
            Axis::Delay => self.delay.bin_width,
        }
    }

    /// Physical coordinates of a cell.
    pub fn physical(&self, point: GridPoint) -> PhysicalPoint {
        PhysicalPoint {
            frequency: self.frequency_at(point.x),
            delay: self.delay_at(point.y),
        }
    }

    /// Nearest cell for a physical `(delay, frequency)` key.
    ///
    /// Frequencies up to 1 % of the band outside it are clamped to the edge;
    /// delays must lie on the axis.
    pub fn position(&self, delay: f64, frequency: f64) -> Result<GridPoint> {
        let (min_delay, max_delay) = (self.min_delay(), self.max_delay());
        if !(min_delay..=max_delay).contains(&delay) {
            return Err(AnalysisError::KeyOutOfRange {
                axis: Axis::Delay,
                value: delay,
                min: min_delay,
                max: max_delay,
            });
        }

        let tolerance = 0.01 * self.band.range();
        if !(frequency + tolerance >= self.band.min && frequency - tolerance <= self.band.max) {
            return Err(AnalysisError::KeyOutOfRange {
                axis: Axis::Frequency,
                value: frequency,
                min: self.band.min,
                max: self.band.max,
            });
        }
        let frequency = frequency.clamp(self.band.min, self.band.max);

        let y = if self.delay.bin_width > 0.0 {
            (((delay - min_delay) / self.delay.bin_width).round() as usize).min(self.height - 1)
        } else {
            0
        };

        Ok(GridPoint::new(nearest_key(&self.column_keys, frequency), y))
    }

    /// Copy of the columns in `range`, keeping their physical frequencies.
    pub fn crop_columns(&self, range: Range<usize>) -> Result<Grid> {
        check_range(Axis::Frequency, &range, self.width)?;
        if range.is_empty() {
            return Err(AnalysisError::InvalidDimensions {
                width: 0,
                height: self.height,
            });
        }
        let band = FrequencyBand::new(
            self.column_keys[range.start],
            self.column_keys[range.end - 1],
        );
        let data = self.data[range.start * self.height..range.end * self.height].to_vec();
        let width = range.len();
        let mut grid = Grid {
            id: self.id.clone(),
            width,
            height: self.height,
            data,
            column_keys: self.column_keys[range].to_vec(),
            band,
            delay: self.delay,
        };
        // a single kept column still needs a non-empty band
        if width == 1 {
            grid.band = self.band;
        }
        Ok(grid)
    }

    /// Mean, standard deviation and maximum over all cells.
    pub fn stats(&self) -> GridStats {
        let n = self.data.len() as f64;
        let mut sum = 0.0f64;
        let mut max = f64::MIN;
        for &v in &self.data {
            sum += v as f64;
            max = max.max(v as f64);
        }
        let mean = sum / n;
        let var = self
            .data
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        GridStats {
            mean,
            std_dev: var.sqrt(),
            max,
        }
    }
}

/// Index of the key closest to `value` in a sorted slice.
pub(crate) fn nearest_key(keys: &[f64], value: f64) -> usize {
    match keys.binary_search_by(|k| k.total_cmp(&value)) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) if i >= keys.len() => keys.len() - 1,
        Err(i) => {
            if (value - keys[i - 1]).abs() <= (keys[i] - value).abs() {
                i - 1
            } else {
                i
            }
        }
    }
}

/// Fail unless `range` lies inside `0..len`.
pub(crate) fn check_range(axis: Axis, range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(AnalysisError::RangeOutOfBounds {
            axis,
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}
