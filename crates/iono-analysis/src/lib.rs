//! Iono Analysis - resampling and feature detection for ionogram frames
//!
//! An ionogram frame is a set of echo-power columns measured at unevenly
//! spaced sounding frequencies. This crate turns frames into evenly sampled
//! grids and finds the features of interest in them:
//!
//! - [`column`] - raw frames, columns and their axes
//! - [`resample`] - uneven-to-even resampling with directional gap filling
//! - [`grid`] - the evenly sampled 2-D grid and its physical axes
//! - [`aggregate`] - row and column sum profiles
//! - [`peaks`] - weighted peak sequences from 1-D profiles
//! - [`period`] - interchangeable period estimators
//! - [`thinning`] - morphological thinning to one-cell skeletons
//! - [`trace`] - echo ridge tracing through a skeleton
//! - [`detect`] - the detection pipeline and its configuration
//! - [`result`] - detection results and result comparison
//! - [`cache`] - bounded frame cache
//! - [`batch`] - independent processing of many frames
//!
//! ## Features
//!
//! - `parallel` (default): [`batch::BatchRunner`] spreads frames over rayon
//! - `tracing`: debug and trace events from the resampler and the detector
//!
//! ## Example Workflow
//!
//! ```rust
//! use iono_analysis::{Column, DelayAxis, Detector, DetectorConfig, Frame, ResampleOptions, Resampler};
//!
//! // 1. Build or load a frame
//! let columns = (0..160)
//!     .map(|i| Column::new(0.1 + i as f64 * 5.4 / 159.0, vec![0.0; 80]))
//!     .collect();
//! let frame = Frame::new("orbit-0001", columns, DelayAxis::marsis_ais());
//!
//! // 2. Resample onto an even grid
//! let grid = Resampler::new(ResampleOptions::marsis_ais()).resample(frame).unwrap();
//!
//! // 3. Detect features
//! let result = Detector::new(DetectorConfig::default()).detect(&grid).unwrap();
//! assert_eq!(result.frame.as_str(), "orbit-0001");
//! ```

pub mod aggregate;
pub mod batch;
pub mod cache;
pub mod column;
pub mod detect;
pub mod error;
pub mod grid;
pub mod peaks;
pub mod period;
pub mod resample;
pub mod result;
pub mod thinning;
pub mod trace;

// Re-export main types
pub use aggregate::{column_sums, project, row_sums};
pub use batch::BatchRunner;
pub use cache::{CacheStats, FrameCache};
pub use column::{Column, DelayAxis, Frame, FrameId, FrequencyBand};
pub use detect::{DetectionStrategy, Detector, DetectorConfig, EchoLineSettings, HarmonicLineSettings};
pub use error::{AnalysisError, Axis, Result};
pub use grid::{Grid, GridPoint, GridStats, PhysicalPoint};
pub use peaks::{PeakSequence, WeightTransform, extract_peaks};
pub use period::{EstimatorKind, PeriodEstimate, PeriodEstimator};
pub use resample::{HeightPolicy, ResampleOptions, Resampler};
pub use result::{
    DetectionResult, EchoKind, EchoTrace, PeriodComparison, PeriodFeature, ResultComparison,
    compare_periods, compare_results,
};
pub use thinning::{Skeleton, ThinningParams, thin};
pub use trace::{TraceSettings, trace};
