//! Independent processing of many frames.
//!
//! [`BatchRunner`] runs resample → detect for each frame. Frames share no
//! mutable state, so with the `parallel` feature (on by default) they are
//! spread over the rayon thread pool; without it they run in order on the
//! calling thread.
//!
//! Cancellation is checked between frames, never inside an algorithm: each
//! frame reads the flag once before it starts and reports
//! [`AnalysisError::Cancelled`] if it is set. Each frame's raw columns are
//! moved into the resampler and freed before gap filling, so a batch never
//! holds the raw and resampled forms of a frame at once.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use iono_analysis::batch::BatchRunner;
//! use iono_analysis::column::{Column, DelayAxis, Frame};
//!
//! let frames: Vec<Frame> = (0..3)
//!     .map(|i| {
//!         let columns = (0..20).map(|c| Column::new(1.0 + c as f64, vec![0.0; 16])).collect();
//!         Frame::new(format!("frame-{i}"), columns, DelayAxis::unit())
//!     })
//!     .collect();
//!
//! let results = BatchRunner::default().run(frames, &AtomicBool::new(false));
//! assert_eq!(results.len(), 3);
//! assert!(results.iter().all(|r| r.is_ok()));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::column::Frame;
use crate::detect::{Detector, DetectorConfig};
use crate::error::{AnalysisError, Result};
use crate::resample::{ResampleOptions, Resampler};
use crate::result::DetectionResult;

/// Resamples and analyses frames, one result per input frame.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    resampler: Resampler,
    detector: Detector,
}

impl BatchRunner {
    /// Create a runner from resampling options and a detector configuration.
    pub fn new(options: ResampleOptions, config: DetectorConfig) -> Self {
        Self {
            resampler: Resampler::new(options),
            detector: Detector::new(config),
        }
    }

    /// The resampler in use.
    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    /// The detector in use.
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Process a single frame.
    pub fn process(&self, frame: Frame) -> Result<DetectionResult> {
        let grid = self.resampler.resample(frame)?;
        self.detector.detect(&grid)
    }

    /// Process every frame, in input order.
    ///
    /// Frames not yet started when `cancel` becomes true yield
    /// [`AnalysisError::Cancelled`]; frames already running finish normally.
    pub fn run(&self, frames: Vec<Frame>, cancel: &AtomicBool) -> Vec<Result<DetectionResult>> {
        #[cfg(feature = "tracing")]
        tracing::debug!(frames = frames.len(), "batch started");

        let step = |frame: Frame| -> Result<DetectionResult> {
            if cancel.load(Ordering::Relaxed) {
                #[cfg(feature = "tracing")]
                tracing::debug!(frame = %frame.id, "batch cancelled before frame");
                return Err(AnalysisError::Cancelled(frame.id.to_string()));
            }
            let result = self.process(frame);

            #[cfg(feature = "tracing")]
            if let Err(e) = &result {
                tracing::warn!(error = %e, "frame failed");
            }

            result
        };

        #[cfg(feature = "parallel")]
        let results: Vec<_> = frames.into_par_iter().map(step).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = frames.into_iter().map(step).collect();

        results
    }
}
