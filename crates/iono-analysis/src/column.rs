//! Raw frame input: measured columns and their axes.
//!
//! A [`Frame`] is what a reader hands to the core: one [`Column`] per sounding
//! frequency, each holding the full echo delay series measured at that
//! frequency. Columns may be spaced unevenly in frequency; the
//! [`Resampler`](crate::resample::Resampler) turns them into an evenly sampled
//! [`Grid`](crate::grid::Grid).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Identity of a source frame, kept in results instead of the sample data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FrameId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One measured frequency's echo intensity over all delay bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    frequency: f64,
    samples: Vec<f32>,
}

impl Column {
    /// Create a column measured at `frequency`.
    pub fn new(frequency: f64, samples: Vec<f32>) -> Self {
        Self { frequency, samples }
    }

    /// Sounding frequency of this column.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Intensity per delay bin.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of delay bins.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the column has no delay bins.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Physical scale of the delay axis: `delay(t) = min + t * bin_width`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayAxis {
    /// Delay of the first bin.
    pub min: f64,
    /// Delay covered by one source bin.
    pub bin_width: f64,
}

impl DelayAxis {
    /// MARSIS AIS delay axis in milliseconds (80 bins of 91.43 µs).
    pub const fn marsis_ais() -> Self {
        Self {
            min: 0.253_928_57,
            bin_width: 0.091_428_57,
        }
    }

    /// Axis with unit bins starting at zero.
    pub const fn unit() -> Self {
        Self {
            min: 0.0,
            bin_width: 1.0,
        }
    }

    /// Delay at source bin `t`.
    pub fn delay_at(&self, t: usize) -> f64 {
        self.min + t as f64 * self.bin_width
    }

    /// Delay of the last bin of an axis with `bins` bins.
    pub fn max_for(&self, bins: usize) -> f64 {
        self.delay_at(bins.saturating_sub(1))
    }
}

impl Default for DelayAxis {
    fn default() -> Self {
        Self::unit()
    }
}

/// Closed frequency interval a grid spans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lowest frequency.
    pub min: f64,
    /// Highest frequency.
    pub max: f64,
}

impl FrequencyBand {
    /// MARSIS AIS sounding band in MHz.
    pub const fn marsis_ais() -> Self {
        Self { min: 0.1, max: 5.5 }
    }

    /// Create a band.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the band.
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Fail unless `min < max` and both are finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.max <= self.min {
            return Err(AnalysisError::DegenerateFrequencyRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Number of sounding frequencies in one AIS frame.
pub const AIS_COLUMN_COUNT: usize = 160;

/// Number of delay bins per AIS column.
pub const AIS_DELAY_BINS: usize = 80;

/// All columns measured during one sounding, plus the delay axis scale.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Source identity carried into the detection result.
    pub id: FrameId,
    /// Measured columns, one per sounding frequency.
    pub columns: Vec<Column>,
    /// Scale of the delay bins shared by all columns.
    pub delay_axis: DelayAxis,
}

impl Frame {
    /// Create a frame.
    pub fn new(id: impl Into<FrameId>, columns: Vec<Column>, delay_axis: DelayAxis) -> Self {
        Self {
            id: id.into(),
            columns,
            delay_axis,
        }
    }

    /// Check the shape invariants and return the common delay series length.
    pub fn validate(&self) -> Result<usize> {
        let first = self.columns.first().ok_or(AnalysisError::EmptyFrame)?;
        let expected = first.len();
        for (index, column) in self.columns.iter().enumerate() {
            if column.is_empty() {
                return Err(AnalysisError::EmptyColumn { index });
            }
            if column.len() != expected {
                return Err(AnalysisError::ColumnLengthMismatch {
                    index,
                    expected,
                    found: column.len(),
                });
            }
            if !column.frequency().is_finite() {
                return Err(AnalysisError::NonFiniteFrequency { index });
            }
        }
        Ok(expected)
    }

    /// Span of the column frequencies.
    pub fn frequency_span(&self) -> Option<FrequencyBand> {
        let mut iter = self.columns.iter().map(Column::frequency);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), f| (lo.min(f), hi.max(f)));
        Some(FrequencyBand { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(freq: f64, len: usize) -> Column {
        Column::new(freq, vec![0.0; len])
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = Frame::new("f", Vec::new(), DelayAxis::unit());
        assert_eq!(frame.validate(), Err(AnalysisError::EmptyFrame));
    }

    #[test]
    fn zero_length_column_is_rejected() {
        let frame = Frame::new("f", vec![column(1.0, 0)], DelayAxis::unit());
        assert_eq!(frame.validate(), Err(AnalysisError::EmptyColumn { index: 0 }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let frame = Frame::new(
            "f",
            vec![column(1.0, 80), column(2.0, 80), column(3.0, 40)],
            DelayAxis::unit(),
        );
        assert!(matches!(
            frame.validate(),
            Err(AnalysisError::ColumnLengthMismatch { index: 2, expected: 80, found: 40 })
        ));
    }

    #[test]
    fn nan_frequency_is_rejected() {
        let frame = Frame::new("f", vec![column(f64::NAN, 4)], DelayAxis::unit());
        assert_eq!(
            frame.validate(),
            Err(AnalysisError::NonFiniteFrequency { index: 0 })
        );
    }

    #[test]
    fn span_ignores_order() {
        let frame = Frame::new(
            "f",
            vec![column(3.0, 2), column(1.0, 2), column(2.0, 2)],
            DelayAxis::unit(),
        );
        assert_eq!(frame.frequency_span(), Some(FrequencyBand::new(1.0, 3.0)));
    }

    #[test]
    fn ais_delay_axis_covers_instrument_range() {
        let axis = DelayAxis::marsis_ais();
        let max = axis.max_for(AIS_DELAY_BINS);
        assert!((max - 7.476_785_6).abs() < 1e-5, "got {max}");
    }

    #[test]
    fn inverted_band_fails_validation() {
        assert!(FrequencyBand::new(2.0, 1.0).validate().is_err());
        assert!(FrequencyBand::marsis_ais().validate().is_ok());
    }
}
