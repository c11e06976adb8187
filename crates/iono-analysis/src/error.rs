//! Error types for the analysis core.
//!
//! Only malformed input is an error. A frame without a periodic pattern or
//! without a traceable echo produces `None` from the corresponding detector
//! stage, never an [`AnalysisError`].

use std::fmt;
use thiserror::Error;

/// Grid axis an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Transmit frequency (grid columns, `x`).
    Frequency,
    /// Echo time delay (grid rows, `y`).
    Delay,
}

impl Axis {
    /// The other axis.
    pub fn orthogonal(self) -> Axis {
        match self {
            Axis::Frequency => Axis::Delay,
            Axis::Delay => Axis::Frequency,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Frequency => f.write_str("frequency"),
            Axis::Delay => f.write_str("delay"),
        }
    }
}

/// Errors raised for input the core cannot process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The frame has no columns.
    #[error("frame contains no columns")]
    EmptyFrame,

    /// A column has a zero-length delay series.
    #[error("column {index} has no delay samples")]
    EmptyColumn {
        /// Position of the column in the frame.
        index: usize,
    },

    /// Columns of one frame disagree on the delay series length.
    #[error("column {index} has {found} delay samples, expected {expected}")]
    ColumnLengthMismatch {
        /// Position of the offending column.
        index: usize,
        /// Length of the first column.
        expected: usize,
        /// Length of the offending column.
        found: usize,
    },

    /// A column frequency is NaN or infinite.
    #[error("column {index} has a non-finite frequency")]
    NonFiniteFrequency {
        /// Position of the offending column.
        index: usize,
    },

    /// The frequency band to resample over is empty or inverted.
    #[error("degenerate frequency range [{min}, {max}]")]
    DegenerateFrequencyRange {
        /// Lower edge of the band.
        min: f64,
        /// Upper edge of the band.
        max: f64,
    },

    /// Requested or computed grid dimensions are unusable.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Number of frequency bins.
        width: usize,
        /// Number of delay bins.
        height: usize,
    },

    /// An index range reaches outside the grid.
    #[error("{axis} range {start}..{end} is outside 0..{len}")]
    RangeOutOfBounds {
        /// Axis the range applies to.
        axis: Axis,
        /// Range start (inclusive).
        start: usize,
        /// Range end (exclusive).
        end: usize,
        /// Axis length.
        len: usize,
    },

    /// A physical key lies outside the axis it is looked up on.
    #[error("{axis} value {value} must lie within [{min}, {max}]")]
    KeyOutOfRange {
        /// Axis of the lookup.
        axis: Axis,
        /// Requested value.
        value: f64,
        /// Axis minimum.
        min: f64,
        /// Axis maximum.
        max: f64,
    },

    /// Parallel arrays do not have matching lengths.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The batch was cancelled before this frame started.
    #[error("processing cancelled before frame '{0}'")]
    Cancelled(String),
}

/// Result alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
