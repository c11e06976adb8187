//! Peak extraction from 1D profiles.
//!
//! [`extract_peaks`] turns a row or column sum profile into a sparse
//! [`PeakSequence`]: values below the 60th percentile are discarded, each
//! remaining hill is reduced to its single highest sample, and the survivors
//! become unit indicators with normalised weights.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::peaks::{WeightTransform, extract_peaks};
//!
//! let signal = [0.0, 1.0, 3.0, 1.0, 0.0, 0.0, 2.0, 5.0, 2.0, 0.0];
//! let seq = extract_peaks(&signal, WeightTransform::Linear);
//! assert_eq!(seq.indices(), vec![2, 7]);
//! assert!((seq.weights[2] + seq.weights[7] - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Quantile below which profile values are never peaks.
pub const PEAK_QUANTILE: f64 = 0.6;

/// How surviving magnitudes become weights before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTransform {
    /// Weights proportional to magnitude.
    #[default]
    Linear,
    /// Weights proportional to the square root of magnitude, flattening
    /// dominant peaks for the harmonic fit.
    Sqrt,
}

impl WeightTransform {
    fn apply(self, value: f64) -> f64 {
        match self {
            WeightTransform::Linear => value,
            WeightTransform::Sqrt => value.sqrt(),
        }
    }
}

/// Binary peak indicators with per-peak weights, parallel to the source profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakSequence {
    /// `1.0` where a peak survived, `0.0` elsewhere.
    pub peaks: Vec<f64>,
    /// Weight of each peak; zero off-peak, summing to 1 when any peak exists.
    pub weights: Vec<f64>,
}

impl PeakSequence {
    /// Build a sequence from parallel arrays.
    pub fn new(peaks: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if peaks.len() != weights.len() {
            return Err(AnalysisError::ShapeMismatch(format!(
                "{} peaks but {} weights",
                peaks.len(),
                weights.len()
            )));
        }
        Ok(Self { peaks, weights })
    }

    /// Equally weighted peaks at `indices` in a sequence of length `len`.
    ///
    /// Indices at or beyond `len` are ignored.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut peaks = vec![0.0; len];
        for &i in indices.iter().filter(|&&i| i < len) {
            peaks[i] = 1.0;
        }
        let count = peaks.iter().filter(|&&p| p > 0.0).count();
        let weights = if count == 0 {
            vec![0.0; len]
        } else {
            peaks.iter().map(|&p| p / count as f64).collect()
        };
        Self { peaks, weights }
    }

    /// Length of the underlying profile.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// True if the underlying profile is empty.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Positions of the peaks in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.peaks
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of peaks.
    pub fn count(&self) -> usize {
        self.peaks.iter().filter(|&&p| p > 0.0).count()
    }

    /// Smallest distance between consecutive peaks, if at least two exist.
    pub fn min_distance(&self) -> Option<usize> {
        self.indices().windows(2).map(|w| w[1] - w[0]).min()
    }
}

/// Reduce `signal` to its dominant local maxima.
///
/// Non-finite and non-positive values never become peaks. Within each run of
/// surviving values, every rise-then-fall hill keeps only its highest sample;
/// on a plateau the earliest sample wins.
pub fn extract_peaks(signal: &[f64], transform: WeightTransform) -> PeakSequence {
    let len = signal.len();
    let cleaned: Vec<f64> = signal
        .iter()
        .map(|&v| if v.is_finite() && v > 0.0 { v } else { 0.0 })
        .collect();

    let threshold = quantile(&cleaned, PEAK_QUANTILE).unwrap_or(0.0);
    let candidates: Vec<f64> = cleaned
        .iter()
        .map(|&v| if v >= threshold { v } else { 0.0 })
        .collect();

    let mut kept = Vec::new();
    let mut best: Option<usize> = None;
    let mut descending = false;
    for i in 0..len {
        let v = candidates[i];
        if v <= 0.0 {
            kept.extend(best.take());
            descending = false;
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) => {
                let prev = candidates[i - 1];
                if descending && v > prev {
                    kept.push(b);
                    best = Some(i);
                    descending = false;
                } else if v < prev {
                    descending = true;
                } else if !descending && v > candidates[b] {
                    best = Some(i);
                }
            }
        }
    }
    kept.extend(best);

    let mut peaks = vec![0.0; len];
    let mut weights = vec![0.0; len];
    for &i in &kept {
        peaks[i] = 1.0;
        weights[i] = transform.apply(candidates[i]);
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
    }

    PeakSequence { peaks, weights }
}

/// Linearly interpolated quantile `p` (in `[0, 1]`) of `values`.
///
/// Returns `None` for an empty slice. Non-finite values sort by
/// `f64::total_cmp`; callers clean their input first.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
