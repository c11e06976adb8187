//! Lomb-Scargle periodogram estimator.

use std::f64::consts::TAU;

use super::{PeriodEstimate, PeriodEstimator, angular_bounds};
use crate::peaks::PeakSequence;

/// Cosine sum below which the time shift `tau` is taken as zero.
const TAU_EPSILON: f64 = 1e-12;

/// Picks the angular frequency of maximum Lomb-Scargle power.
///
/// The candidate frequencies sweep `[2π/(len/2), 2π/min_distance]` linearly
/// with `oversampling * len` samples, both ends included. The weights, centred
/// on their mean, are the sampled values. Ties keep the lowest frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodogram {
    /// Frequency samples per sequence element.
    pub oversampling: usize,
}

impl Default for Periodogram {
    fn default() -> Self {
        Self { oversampling: 4 }
    }
}

impl Periodogram {
    /// Time shift of a `len`-sample sequence at angular frequency `omega`.
    ///
    /// `tau = atan(Σ sin(2ωt) / Σ cos(2ωt)) / 2π`, or zero when the cosine
    /// sum is negligible.
    pub fn time_shift(len: usize, omega: f64) -> f64 {
        let (mut sin2, mut cos2) = (0.0, 0.0);
        for t in 0..len {
            let arg = 2.0 * omega * t as f64;
            sin2 += arg.sin();
            cos2 += arg.cos();
        }
        if cos2.abs() < TAU_EPSILON {
            0.0
        } else {
            (sin2 / cos2).atan() / TAU
        }
    }

    /// Lomb-Scargle power of `values` (sampled at `0..len`) at angular frequency `omega`.
    ///
    /// Degenerate sums are absorbed: a negligible cosine sum sets `tau = 0`,
    /// and a vanishing quadrature term contributes nothing.
    pub fn power(values: &[f64], omega: f64) -> f64 {
        let tau = Self::time_shift(values.len(), omega);

        let (mut yc, mut ys, mut cc, mut ss) = (0.0, 0.0, 0.0, 0.0);
        for (t, &y) in values.iter().enumerate() {
            let arg = omega * (t as f64 - tau);
            let (s, c) = arg.sin_cos();
            yc += y * c;
            ys += y * s;
            cc += c * c;
            ss += s * s;
        }

        let mut power = 0.0;
        if cc > TAU_EPSILON {
            power += yc * yc / cc;
        }
        if ss > TAU_EPSILON {
            power += ys * ys / ss;
        }
        0.5 * power
    }
}

impl PeriodEstimator for Periodogram {
    fn estimate(&self, peaks: &PeakSequence) -> Option<PeriodEstimate> {
        let (low, high) = angular_bounds(peaks)?;

        let n = peaks.len() as f64;
        let mean = peaks.weights.iter().sum::<f64>() / n;
        let values: Vec<f64> = peaks.weights.iter().map(|w| w - mean).collect();
        if values.iter().all(|v| v.abs() < f64::EPSILON) {
            // every position is an equally weighted peak
            return Some(PeriodEstimate::unanchored(TAU / high));
        }

        let samples = (self.oversampling.max(1) * peaks.len()).max(2);
        let step = (high - low) / (samples - 1) as f64;

        let mut best = (f64::NEG_INFINITY, low);
        for k in 0..samples {
            let omega = low + step * k as f64;
            let p = Self::power(&values, omega);
            if p > best.0 {
                best = (p, omega);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(power = best.0, omega = best.1, "periodogram: best frequency");

        Some(PeriodEstimate::unanchored(TAU / best.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic_column_sums() {
        let seq = PeakSequence::from_indices(160, &[10, 30, 50, 70]);
        let est = Periodogram::default().estimate(&seq).unwrap();
        assert!((est.period - 20.0).abs() <= 1.0, "period {}", est.period);
        assert_eq!(est.offset, None);
    }

    #[test]
    fn test_two_distant_peaks() {
        let seq = PeakSequence::from_indices(100, &[0, 50]);
        let est = Periodogram::default().estimate(&seq).unwrap();
        assert!((est.period - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_shift() {
        // args 0 and π/4: atan((√2/2) / (1 + √2/2)) = π/8
        let tau = Periodogram::time_shift(2, std::f64::consts::PI / 8.0);
        assert!((tau - 1.0 / 16.0).abs() < 1e-12, "tau {tau}");

        // args 0, π/2, π, 3π/2: the cosine sum vanishes
        assert_eq!(Periodogram::time_shift(4, std::f64::consts::FRAC_PI_4), 0.0);
        assert_eq!(Periodogram::time_shift(0, 1.0), 0.0);
    }

    #[test]
    fn test_power_is_finite_at_degenerate_tau() {
        // 2ω = 2π/5 over 100 samples: both shift sums vanish
        let mut values = vec![-0.01; 100];
        for t in (0..100).step_by(10) {
            values[t] += 0.1;
        }
        let p = Periodogram::power(&values, TAU / 10.0);
        assert!(p.is_finite() && p > 0.0);
    }

    #[test]
    fn test_power_at_nyquist_is_finite() {
        let values = [1.0, -1.0, 1.0, -1.0];
        assert!(Periodogram::power(&values, std::f64::consts::PI).is_finite());
    }

    #[test]
    fn test_dense_equal_peaks() {
        let seq = PeakSequence::from_indices(8, &[0, 1, 2, 3, 4, 5, 6, 7]);
        let est = Periodogram::default().estimate(&seq).unwrap();
        assert!((est.period - 1.0).abs() < 1e-12);
    }
}
