//! Uneven-to-even resampling of raw frames onto a uniform [`Grid`].
//!
//! Sounders step through a frequency table whose spacing is not constant, so
//! the raw columns of a frame sit at irregular positions along the frequency
//! axis. The [`Resampler`] bins them onto an evenly spaced grid and fills the
//! cells between measured columns by directional nearest-neighbour
//! interpolation.
//!
//! # Algorithm
//!
//! 1. **Target size.** Unless given, the width is
//!    `ceil(band_range / min_gap)` where `min_gap` is the smallest positive
//!    distance between adjacent column frequencies, capped at
//!    [`ResampleOptions::max_samples`]. The height is half the width, or the
//!    source bin count (see [`HeightPolicy`]).
//! 2. **Binning.** Column frequency and source delay index are mapped linearly
//!    onto `0..=width-1` and `0..=height-1` and floored. Samples sharing a cell
//!    are averaged.
//! 3. **First fill pass.** Every empty cell gets the mean of a frequency-axis
//!    estimate (neighbours left/right within `max_decay_bins`) and a delay-axis
//!    estimate (neighbours above/below anywhere in the column). With two
//!    neighbours the estimate is a linear blend weighted by proximity; with one
//!    it decays linearly towards zero at the window edge; with none it is zero.
//! 4. **Second fill pass.** Cells that are still empty are filled from the
//!    frequency axis alone, which closes diagonal gaps left by the first pass.
//!
//! The decay window is `ceil(width / 160) * 4` bins: four source columns of a
//! 160-frequency sounding, expressed in output bins.
//!
//! # Memory
//!
//! [`Resampler::resample`] takes the [`Frame`] by value and drops the raw
//! column storage as soon as it has been binned, before gap filling allocates
//! its working buffers. Batch loops therefore never hold a frame's raw and
//! resampled forms at the same time.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::column::{Column, DelayAxis, Frame};
//! use iono_analysis::resample::Resampler;
//!
//! let columns = (0..40)
//!     .map(|i| Column::new(1.0 + i as f64 * 0.1, vec![1.0; 16]))
//!     .collect();
//! let frame = Frame::new("demo", columns, DelayAxis::unit());
//!
//! let grid = Resampler::default().resample(frame).unwrap();
//! assert_eq!(grid.height(), grid.width() / 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::column::{AIS_COLUMN_COUNT, DelayAxis, Frame, FrequencyBand};
use crate::error::{AnalysisError, Result};
use crate::grid::{Grid, NO_DATA};

/// Upper bound on the computed grid width.
pub const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Number of source columns whose spacing defines the decay window unit.
pub const DECAY_REFERENCE_COLUMNS: usize = AIS_COLUMN_COUNT;

/// Decay window length in reference column spacings.
pub const DECAY_SPAN: usize = 4;

/// Fraction of the band below which adjacent column gaps count as duplicates.
const DUPLICATE_GAP_FRACTION: f64 = 1e-9;

/// Guards the floor in [`map_to_bin`] against values a rounding error below an integer.
const BIN_EPSILON: f64 = 1e-9;

/// How the grid height is chosen when not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightPolicy {
    /// Half the grid width, preserving the aspect ratio of the raw display.
    #[default]
    HalfWidth,
    /// The number of delay bins in the source columns.
    SourceBins,
}

/// Options controlling the output grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleOptions {
    /// Fixed output width; computed from the column spacing when `None`.
    pub width: Option<usize>,
    /// Fixed output height; derived from [`Self::height_policy`] when `None`.
    pub height: Option<usize>,
    /// Cap for the computed width.
    pub max_samples: usize,
    /// Height rule used when `height` is `None`.
    pub height_policy: HeightPolicy,
    /// Band mapped onto the grid; the span of the input columns when `None`.
    pub band: Option<FrequencyBand>,
    /// Column count whose spacing is the decay window unit.
    pub decay_reference_columns: usize,
    /// Decay window length in those units.
    pub decay_span: usize,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            max_samples: DEFAULT_MAX_SAMPLES,
            height_policy: HeightPolicy::HalfWidth,
            band: None,
            decay_reference_columns: DECAY_REFERENCE_COLUMNS,
            decay_span: DECAY_SPAN,
        }
    }
}

impl ResampleOptions {
    /// Options for MARSIS AIS frames: fixed 0.1–5.5 MHz band.
    pub fn marsis_ais() -> Self {
        Self {
            band: Some(FrequencyBand::marsis_ais()),
            ..Self::default()
        }
    }

    /// Set a fixed output size.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the band mapped onto the grid.
    pub fn with_band(mut self, band: FrequencyBand) -> Self {
        self.band = Some(band);
        self
    }
}

/// Converts raw frames into evenly sampled grids.
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    options: ResampleOptions,
}

impl Resampler {
    /// Create a resampler with the given options.
    pub fn new(options: ResampleOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    /// Output `(width, height)` this resampler would produce for `frame`.
    pub fn target_dimensions(&self, frame: &Frame) -> Result<(usize, usize)> {
        let source_bins = frame.validate()?;
        let band = self.band_for(frame)?;
        let mut frequencies: Vec<f64> = frame.columns.iter().map(|c| c.frequency()).collect();
        frequencies.sort_by(f64::total_cmp);
        self.dimensions(&frequencies, band, source_bins)
    }

    /// Resample `frame` onto an even grid, consuming its raw columns.
    pub fn resample(&self, frame: Frame) -> Result<Grid> {
        let source_bins = frame.validate()?;
        let band = self.band_for(&frame)?;

        let Frame {
            id,
            columns,
            delay_axis,
        } = frame;

        let mut frequencies: Vec<f64> = columns.iter().map(|c| c.frequency()).collect();
        frequencies.sort_by(f64::total_cmp);
        let (width, height) = self.dimensions(&frequencies, band, source_bins)?;

        let mut sums = vec![0.0f64; width * height];
        let mut counts = vec![0u32; width * height];
        for column in &columns {
            let x = map_to_bin(column.frequency(), band.min, band.max, width);
            for (t, &sample) in column.samples().iter().enumerate() {
                if !sample.is_finite() {
                    continue;
                }
                let y = map_to_bin(t as f64, 0.0, (source_bins - 1) as f64, height);
                sums[x * height + y] += sample as f64;
                counts[x * height + y] += 1;
            }
        }
        drop(columns);

        let mut filled: Vec<bool> = counts.iter().map(|&c| c > 0).collect();
        let mut data: Vec<f32> = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { (s / c as f64) as f32 } else { NO_DATA })
            .collect();
        drop(sums);
        drop(counts);

        let decay_bins = self.max_decay_bins(width);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            frame = %id,
            width,
            height,
            measured = filled.iter().filter(|&&f| f).count(),
            decay_bins,
            "resample: binned source columns"
        );

        // First pass: both axes from the measured cells.
        let along_frequency = estimate_rows(&data, &filled, width, height, decay_bins);
        let along_delay = estimate_columns(&data, &filled, width, height, height);
        for i in 0..data.len() {
            if !filled[i] {
                data[i] = (along_frequency[i] + along_delay[i]) / 2.0;
            }
        }

        // Second pass: frequency axis only, over everything the first pass reached.
        for (f, &v) in filled.iter_mut().zip(&data) {
            *f = v > 0.0;
        }
        let along_frequency = estimate_rows(&data, &filled, width, height, decay_bins);
        for i in 0..data.len() {
            if !filled[i] {
                data[i] = along_frequency[i];
            }
        }

        let out_delay = DelayAxis {
            min: delay_axis.min,
            bin_width: if height > 1 {
                delay_axis.bin_width * (source_bins - 1) as f64 / (height - 1) as f64
            } else {
                delay_axis.bin_width * (source_bins - 1) as f64
            },
        };

        Grid::new(id, width, height, data, band, out_delay)
    }

    /// Half-width of the frequency-axis interpolation window in output bins.
    pub fn max_decay_bins(&self, width: usize) -> usize {
        let reference = self.options.decay_reference_columns.max(1);
        width.div_ceil(reference) * self.options.decay_span
    }

    fn band_for(&self, frame: &Frame) -> Result<FrequencyBand> {
        let band = match self.options.band {
            Some(band) => band,
            None => frame.frequency_span().ok_or(AnalysisError::EmptyFrame)?,
        };
        band.validate()?;
        Ok(band)
    }

    fn dimensions(
        &self,
        sorted_frequencies: &[f64],
        band: FrequencyBand,
        source_bins: usize,
    ) -> Result<(usize, usize)> {
        let width = match self.options.width {
            Some(w) => w,
            None => ideal_width(sorted_frequencies, band.range(), self.options.max_samples)
                .ok_or(AnalysisError::DegenerateFrequencyRange {
                    min: sorted_frequencies.first().copied().unwrap_or(band.min),
                    max: sorted_frequencies.last().copied().unwrap_or(band.max),
                })?,
        };
        let height = match (self.options.height, self.options.height_policy) {
            (Some(h), _) => h,
            (None, HeightPolicy::HalfWidth) => (width / 2).max(1),
            (None, HeightPolicy::SourceBins) => source_bins,
        };
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        Ok((width, height))
    }
}

/// Number of frequency bins needed to resolve the closest pair of columns.
///
/// Gaps smaller than a millionth of a millionth of the band are treated as
/// duplicate frequencies. Returns `None` when no usable gap exists.
pub fn ideal_width(sorted_frequencies: &[f64], band_range: f64, max_samples: usize) -> Option<usize> {
    let epsilon = band_range.abs() * DUPLICATE_GAP_FRACTION;
    let min_gap = sorted_frequencies
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&gap| gap > epsilon)
        .fold(f64::INFINITY, f64::min);

    if !min_gap.is_finite() || band_range <= 0.0 {
        return None;
    }

    let ideal = (band_range / min_gap).ceil();
    Some((ideal as usize).clamp(1, max_samples.max(1)))
}

/// Map `value` from `[min, max]` onto bin indices `0..bins`, flooring.
///
/// Values outside the interval are clamped to the first or last bin.
pub fn map_to_bin(value: f64, min: f64, max: f64, bins: usize) -> usize {
    if bins <= 1 || max <= min {
        return 0;
    }
    let last = (bins - 1) as f64;
    let position = (value - min) * last / (max - min);
    let bin = (position + BIN_EPSILON).floor();
    if bin <= 0.0 {
        0
    } else {
        (bin as usize).min(bins - 1)
    }
}

/// Directional estimate for every unfilled position of one line.
///
/// Filled positions and positions without a neighbour within `window` get 0.
fn estimate_line(values: &[f32], filled: &[bool], window: usize, out: &mut [f32]) {
    let len = values.len();
    let mut previous: Option<usize> = None;
    let mut before = vec![None; len];
    for i in 0..len {
        before[i] = previous;
        if filled[i] {
            previous = Some(i);
        }
    }

    let mut next: Option<usize> = None;
    for i in (0..len).rev() {
        if filled[i] {
            out[i] = 0.0;
            next = Some(i);
            continue;
        }

        let left = before[i].filter(|&l| i - l <= window);
        let right = next.filter(|&r| r - i <= window);
        out[i] = match (left, right) {
            (Some(l), Some(r)) => {
                let dl = (i - l) as f32;
                let dr = (r - i) as f32;
                (values[l] * dr + values[r] * dl) / (dl + dr)
            }
            (Some(l), None) => values[l] * decay(i - l, window),
            (None, Some(r)) => values[r] * decay(r - i, window),
            (None, None) => NO_DATA,
        };
    }
}

/// Linear falloff reaching zero one bin past the window edge.
#[inline]
fn decay(distance: usize, window: usize) -> f32 {
    1.0 - distance as f32 / (window + 1) as f32
}

/// Frequency-axis estimates for the whole grid (one line per delay row).
fn estimate_rows(
    data: &[f32],
    filled: &[bool],
    width: usize,
    height: usize,
    window: usize,
) -> Vec<f32> {
    let mut out = vec![NO_DATA; data.len()];
    let mut row = vec![0.0f32; width];
    let mut row_filled = vec![false; width];
    let mut row_out = vec![0.0f32; width];
    for y in 0..height {
        for x in 0..width {
            row[x] = data[x * height + y];
            row_filled[x] = filled[x * height + y];
        }
        estimate_line(&row, &row_filled, window, &mut row_out);
        for x in 0..width {
            out[x * height + y] = row_out[x];
        }
    }
    out
}

/// Delay-axis estimates for the whole grid (one line per frequency column).
fn estimate_columns(
    data: &[f32],
    filled: &[bool],
    width: usize,
    height: usize,
    window: usize,
) -> Vec<f32> {
    let mut out = vec![NO_DATA; data.len()];
    for x in 0..width {
        let span = x * height..(x + 1) * height;
        estimate_line(&data[span.clone()], &filled[span.clone()], window, &mut out[span]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn frame(freqs: &[f64], bins: usize, value: f32) -> Frame {
        let columns = freqs
            .iter()
            .map(|&f| Column::new(f, vec![value; bins]))
            .collect();
        Frame::new("t", columns, DelayAxis::unit())
    }

    #[test]
    fn test_map_to_bin_endpoints() {
        assert_eq!(map_to_bin(0.0, 0.0, 10.0, 11), 0);
        assert_eq!(map_to_bin(10.0, 0.0, 10.0, 11), 10);
        assert_eq!(map_to_bin(4.99, 0.0, 10.0, 11), 4);
        assert_eq!(map_to_bin(-3.0, 0.0, 10.0, 11), 0);
        assert_eq!(map_to_bin(30.0, 0.0, 10.0, 11), 10);
    }

    #[test]
    fn test_map_to_bin_exact_integers() {
        // 40 of 0..=79 onto 80 bins is exactly bin 40
        assert_eq!(map_to_bin(40.0, 0.0, 79.0, 80), 40);
        for t in 0..80 {
            assert_eq!(map_to_bin(t as f64, 0.0, 79.0, 80), t);
        }
    }

    #[test]
    fn test_ideal_width_uses_min_gap() {
        let freqs = [0.0, 1.0, 1.5, 4.0];
        assert_eq!(ideal_width(&freqs, 4.0, 1000), Some(8));
    }

    #[test]
    fn test_ideal_width_ignores_duplicates() {
        let freqs = [0.0, 1.0, 1.0, 2.0];
        assert_eq!(ideal_width(&freqs, 2.0, 1000), Some(2));
    }

    #[test]
    fn test_ideal_width_is_capped() {
        let freqs = [0.0, 0.001, 10.0];
        assert_eq!(ideal_width(&freqs, 10.0, 1000), Some(1000));
    }

    #[test]
    fn test_ideal_width_without_gap() {
        assert_eq!(ideal_width(&[3.0], 1.0, 1000), None);
        assert_eq!(ideal_width(&[3.0, 3.0], 1.0, 1000), None);
    }

    #[test]
    fn test_decay_window() {
        let r = Resampler::default();
        assert_eq!(r.max_decay_bins(160), 4);
        assert_eq!(r.max_decay_bins(161), 8);
        assert_eq!(r.max_decay_bins(1000), 28);
    }

    #[test]
    fn test_estimate_line_blends_by_proximity() {
        let values = [2.0, 0.0, 0.0, 0.0, 6.0];
        let filled = [true, false, false, false, true];
        let mut out = [0.0; 5];
        estimate_line(&values, &filled, 10, &mut out);
        assert_eq!(out, [0.0, 3.0, 4.0, 5.0, 0.0]);
    }

    #[test]
    fn test_estimate_line_one_sided_decay() {
        let values = [4.0, 0.0, 0.0, 0.0, 0.0];
        let filled = [true, false, false, false, false];
        let mut out = [0.0; 5];
        estimate_line(&values, &filled, 3, &mut out);
        assert_eq!(out, [0.0, 3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_estimate_line_without_neighbours() {
        let values = [0.0; 4];
        let filled = [false; 4];
        let mut out = [9.0; 4];
        estimate_line(&values, &filled, 3, &mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_explicit_size_is_honoured() {
        let grid = Resampler::new(ResampleOptions::default().with_size(32, 10))
            .resample(frame(&[1.0, 2.0, 3.5], 20, 1.0))
            .unwrap();
        assert_eq!((grid.width(), grid.height()), (32, 10));
    }

    #[test]
    fn test_source_bins_height_policy() {
        let options = ResampleOptions {
            height_policy: HeightPolicy::SourceBins,
            ..ResampleOptions::default()
        };
        let grid = Resampler::new(options)
            .resample(frame(&[1.0, 2.0, 3.0, 5.0], 12, 1.0))
            .unwrap();
        assert_eq!(grid.height(), 12);
        assert_eq!(grid.width(), 4);
    }

    #[test]
    fn test_constant_frame_stays_constant() {
        // uneven spacing leaves gaps between measured columns
        let grid = Resampler::default()
            .resample(frame(&[0.0, 1.0, 1.5, 3.0, 4.0], 16, 2.0))
            .unwrap();
        assert_eq!(grid.width(), 8);
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let v = grid.get(x, y);
                assert!(v.is_finite());
                assert!(v > 0.0 && v <= 2.0, "cell ({x},{y}) = {v}");
            }
        }
        assert_eq!(grid.get(0, 0), 2.0);
        assert_eq!(grid.get(7, 3), 2.0);
    }

    #[test]
    fn test_empty_frame_fails() {
        let err = Resampler::default().resample(Frame::new("e", Vec::new(), DelayAxis::unit()));
        assert_eq!(err.unwrap_err(), AnalysisError::EmptyFrame);
    }

    #[test]
    fn test_single_frequency_without_band_fails() {
        let err = Resampler::default().resample(frame(&[2.0, 2.0], 8, 1.0));
        assert!(matches!(
            err,
            Err(AnalysisError::DegenerateFrequencyRange { .. })
        ));
    }

    #[test]
    fn test_nan_samples_are_skipped() {
        let mut f = frame(&[0.0, 1.0, 2.0, 3.0], 8, 1.0);
        f.columns[1] = Column::new(1.0, vec![f32::NAN; 8]);
        let grid = Resampler::default().resample(f).unwrap();
        assert!(grid.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_output_delay_axis_spans_source() {
        let mut f = frame(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 80, 1.0);
        f.delay_axis = DelayAxis::marsis_ais();
        let grid = Resampler::default().resample(f).unwrap();
        assert_eq!(grid.height(), 3);
        let source_max = DelayAxis::marsis_ais().max_for(80);
        assert!((grid.max_delay() - source_max).abs() < 1e-9);
    }
}
