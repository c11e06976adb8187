//! Trimmed weighted mean of inter-peak distances.

use super::{PeriodEstimate, PeriodEstimator};
use crate::peaks::{PeakSequence, quantile};

/// Estimates the period as the weighted mean of consecutive peak distances,
/// ignoring distances above a quantile.
///
/// Missed peaks show up as long distances (two or three periods), so the
/// upper tail is discarded before averaging. Each distance is weighted by the
/// mean weight of its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileDistance {
    /// Distances above this quantile of all distances are dropped.
    pub keep_quantile: f64,
}

impl Default for QuantileDistance {
    fn default() -> Self {
        Self {
            keep_quantile: 0.65,
        }
    }
}

impl PeriodEstimator for QuantileDistance {
    fn estimate(&self, peaks: &PeakSequence) -> Option<PeriodEstimate> {
        let indices = peaks.indices();
        if indices.len() < 2 {
            return None;
        }

        let pairs: Vec<(f64, f64)> = indices
            .windows(2)
            .map(|w| {
                let distance = (w[1] - w[0]) as f64;
                let weight = (peaks.weights[w[0]] + peaks.weights[w[1]]) / 2.0;
                (distance, weight)
            })
            .collect();

        if let [(distance, _)] = pairs.as_slice() {
            return Some(PeriodEstimate::unanchored(*distance));
        }

        let distances: Vec<f64> = pairs.iter().map(|&(d, _)| d).collect();
        let cutoff = quantile(&distances, self.keep_quantile)?;
        let kept: Vec<(f64, f64)> = pairs.into_iter().filter(|&(d, _)| d <= cutoff).collect();

        let weight_sum: f64 = kept.iter().map(|&(_, w)| w).sum();
        let period = if weight_sum > 0.0 {
            kept.iter().map(|&(d, w)| d * w).sum::<f64>() / weight_sum
        } else {
            kept.iter().map(|&(d, _)| d).sum::<f64>() / kept.len() as f64
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(period, cutoff, kept = kept.len(), "quantile distance");

        (period > 0.0).then(|| PeriodEstimate::unanchored(period))
    }
}
