//! Repetition period estimation from weighted peak sequences.
//!
//! Three interchangeable strategies implement [`PeriodEstimator`]:
//!
//! | Strategy | Approach | Offset |
//! |----------|----------|--------|
//! | [`Periodogram`] | Lomb-Scargle power maximisation | none |
//! | [`HarmonicFit`] | Bounded least-squares cosine fit | first crest |
//! | [`QuantileDistance`] | Trimmed weighted mean of peak spacing | none |
//!
//! Every estimator returns `None` when the sequence holds too few peaks to
//! define a period. That is the normal outcome for frames without periodic
//! structure and never an error.
//!
//! [`EstimatorKind`] selects a strategy from configuration.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::peaks::PeakSequence;
//! use iono_analysis::period::EstimatorKind;
//!
//! let seq = PeakSequence::from_indices(100, &[5, 15, 25, 35, 45]);
//! let estimate = EstimatorKind::QuantileDistance.estimate(&seq).unwrap();
//! assert!((estimate.period - 10.0).abs() < 1e-9);
//! ```

mod harmonic;
mod periodogram;
mod quantile;

pub use harmonic::HarmonicFit;
pub use periodogram::Periodogram;
pub use quantile::QuantileDistance;

use serde::{Deserialize, Serialize};

use crate::peaks::{PeakSequence, WeightTransform};

/// Estimated repetition period in bins, with an optional phase anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimate {
    /// Bin of the first repetition, if the strategy constrains phase.
    ///
    /// [`HarmonicFit`] reports the first crest of the fitted cosine,
    /// `round(((-φ) mod 2π) / f)`, which is a bin index rather than the
    /// rounded phase `φ` itself.
    pub offset: Option<i64>,
    /// Distance between repetitions in bins; always positive.
    pub period: f64,
}

impl PeriodEstimate {
    /// An estimate without phase information.
    pub fn unanchored(period: f64) -> Self {
        Self {
            offset: None,
            period,
        }
    }
}

/// A strategy that derives a repetition period from weighted peaks.
pub trait PeriodEstimator {
    /// Estimate the period of `peaks`, or `None` if no periodic pattern exists.
    fn estimate(&self, peaks: &PeakSequence) -> Option<PeriodEstimate>;

    /// Weighting the peak extractor should apply for this estimator.
    fn weight_transform(&self) -> WeightTransform {
        WeightTransform::Linear
    }
}

/// Configuration-level selector for a [`PeriodEstimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// [`Periodogram`] with default oversampling.
    #[default]
    Periodogram,
    /// [`HarmonicFit`] with default solver settings.
    HarmonicFit,
    /// [`QuantileDistance`] with the default trim quantile.
    QuantileDistance,
}

impl EstimatorKind {
    /// All strategies, in declaration order.
    pub const ALL: [EstimatorKind; 3] = [
        EstimatorKind::Periodogram,
        EstimatorKind::HarmonicFit,
        EstimatorKind::QuantileDistance,
    ];

    /// Run the selected strategy with its default parameters.
    pub fn estimate(self, peaks: &PeakSequence) -> Option<PeriodEstimate> {
        match self {
            EstimatorKind::Periodogram => Periodogram::default().estimate(peaks),
            EstimatorKind::HarmonicFit => HarmonicFit::default().estimate(peaks),
            EstimatorKind::QuantileDistance => QuantileDistance::default().estimate(peaks),
        }
    }

    /// Weighting the peak extractor should apply for this strategy.
    pub fn weight_transform(self) -> WeightTransform {
        match self {
            EstimatorKind::HarmonicFit => WeightTransform::Sqrt,
            _ => WeightTransform::Linear,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            EstimatorKind::Periodogram => "periodogram",
            EstimatorKind::HarmonicFit => "harmonic_fit",
            EstimatorKind::QuantileDistance => "quantile_distance",
        }
    }
}

/// Angular frequency bounds `[2π/(len/2), 2π/min_distance]` for a sequence.
///
/// When the closest peaks are more than half the sequence apart the interval
/// collapses onto `2π/min_distance`. `None` if fewer than two peaks exist.
pub(crate) fn angular_bounds(peaks: &PeakSequence) -> Option<(f64, f64)> {
    let min_distance = peaks.min_distance()? as f64;
    let half = peaks.len() as f64 / 2.0;
    let high = std::f64::consts::TAU / min_distance;
    let low = (std::f64::consts::TAU / half).min(high);
    (low.is_finite() && high.is_finite()).then_some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulses(period: usize, len: usize) -> PeakSequence {
        let idx: Vec<usize> = (0..len).step_by(period).collect();
        PeakSequence::from_indices(len, &idx)
    }

    #[test]
    fn test_all_strategies_agree_on_exact_impulses() {
        let seq = impulses(10, 100);
        for kind in EstimatorKind::ALL {
            let est = kind
                .estimate(&seq)
                .unwrap_or_else(|| panic!("{} found no period", kind.name()));
            assert!(
                (est.period - 10.0).abs() <= 1.0,
                "{} estimated {}",
                kind.name(),
                est.period
            );
        }
    }

    #[test]
    fn test_no_peaks_is_none_for_all() {
        let seq = PeakSequence::from_indices(64, &[]);
        for kind in EstimatorKind::ALL {
            assert!(kind.estimate(&seq).is_none(), "{}", kind.name());
        }
    }

    #[test]
    fn test_single_peak_is_none_for_all() {
        let seq = PeakSequence::from_indices(64, &[17]);
        for kind in EstimatorKind::ALL {
            assert!(kind.estimate(&seq).is_none(), "{}", kind.name());
        }
    }

    #[test]
    fn test_angular_bounds() {
        let seq = impulses(10, 100);
        let (lo, hi) = angular_bounds(&seq).unwrap();
        assert!((lo - std::f64::consts::TAU / 50.0).abs() < 1e-12);
        assert!((hi - std::f64::consts::TAU / 10.0).abs() < 1e-12);

        let wide = PeakSequence::from_indices(64, &[0, 60]);
        let (lo, hi) = angular_bounds(&wide).unwrap();
        assert_eq!(lo, hi);
    }

    #[test]
    fn test_weight_transform_per_kind() {
        assert_eq!(EstimatorKind::HarmonicFit.weight_transform(), WeightTransform::Sqrt);
        assert_eq!(EstimatorKind::Periodogram.weight_transform(), WeightTransform::Linear);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&EstimatorKind::QuantileDistance).unwrap();
        assert_eq!(json, "\"quantile_distance\"");
    }
}
