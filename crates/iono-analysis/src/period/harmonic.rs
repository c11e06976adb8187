//! Bounded least-squares harmonic fit.
//!
//! Fits `cos(f·x + φ)` with unit amplitude to the weighted peak positions by
//! Levenberg-Marquardt on `(f, φ)`. Each step is projected back into
//! `f ∈ [2π/(len/2), 2π/min_distance]`, so the solver never leaves the
//! physically meaningful frequency range.

use std::f64::consts::TAU;

use super::{PeriodEstimate, PeriodEstimator, angular_bounds};
use crate::peaks::{PeakSequence, WeightTransform};

/// Levenberg-Marquardt fit of a unit cosine to peak positions.
///
/// Residuals are `sqrt(w_i) * (1 - cos(f·x_i + φ))` over the peaks, so a
/// perfect fit puts a crest on every peak. The seed uses the median peak
/// spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicFit {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Relative cost change below which the fit stops.
    pub tolerance: f64,
    /// Starting damping factor.
    pub initial_lambda: f64,
}

impl Default for HarmonicFit {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-12,
            initial_lambda: 1e-3,
        }
    }
}

/// Weighted peak positions the residuals are evaluated at.
struct Samples {
    x: Vec<f64>,
    sqrt_w: Vec<f64>,
}

impl Samples {
    fn from_peaks(peaks: &PeakSequence) -> Self {
        let indices = peaks.indices();
        let total: f64 = indices.iter().map(|&i| peaks.weights[i]).sum();
        let sqrt_w = indices
            .iter()
            .map(|&i| {
                if total > 0.0 {
                    peaks.weights[i].max(0.0).sqrt()
                } else {
                    1.0
                }
            })
            .collect();
        Self {
            x: indices.iter().map(|&i| i as f64).collect(),
            sqrt_w,
        }
    }

    fn cost(&self, f: f64, phi: f64) -> f64 {
        self.x
            .iter()
            .zip(&self.sqrt_w)
            .map(|(&x, &s)| {
                let r = s * (1.0 - (f * x + phi).cos());
                r * r
            })
            .sum()
    }

    /// Normal equations `JᵀJ` (row-major 2x2) and `Jᵀr`.
    fn normal_equations(&self, f: f64, phi: f64) -> ([f64; 4], [f64; 2]) {
        let mut jtj = [0.0; 4];
        let mut jtr = [0.0; 2];
        for (&x, &s) in self.x.iter().zip(&self.sqrt_w) {
            let theta = f * x + phi;
            let r = s * (1.0 - theta.cos());
            let d_phi = s * theta.sin();
            let d_f = d_phi * x;
            jtj[0] += d_f * d_f;
            jtj[1] += d_f * d_phi;
            jtj[3] += d_phi * d_phi;
            jtr[0] += d_f * r;
            jtr[1] += d_phi * r;
        }
        jtj[2] = jtj[1];
        (jtj, jtr)
    }
}

/// Solve the 2x2 system `a · δ = b`, `None` if singular.
fn solve_2x2(a: &[f64; 4], b: &[f64; 2]) -> Option<[f64; 2]> {
    let det = a[0] * a[3] - a[1] * a[2];
    if det.abs() < 1e-300 || !det.is_finite() {
        return None;
    }
    Some([
        (a[3] * b[0] - a[1] * b[1]) / det,
        (a[0] * b[1] - a[2] * b[0]) / det,
    ])
}

fn wrap_phase(phi: f64) -> f64 {
    let wrapped = phi.rem_euclid(TAU);
    if wrapped > std::f64::consts::PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

impl HarmonicFit {
    /// Fit `(f, φ)` starting from `seed`, with `f` held inside `[low, high]`.
    fn fit(&self, samples: &Samples, seed: (f64, f64), low: f64, high: f64) -> (f64, f64, f64) {
        let (mut f, mut phi) = (seed.0.clamp(low, high), wrap_phase(seed.1));
        let mut cost = samples.cost(f, phi);
        let mut lambda = self.initial_lambda;

        for _ in 0..self.max_iterations {
            let (jtj, jtr) = samples.normal_equations(f, phi);
            if jtr[0].abs() + jtr[1].abs() < 1e-15 {
                break;
            }

            let mut improved = false;
            while lambda < 1e12 {
                let damped = [
                    jtj[0] * (1.0 + lambda) + 1e-10,
                    jtj[1],
                    jtj[2],
                    jtj[3] * (1.0 + lambda) + 1e-10,
                ];
                let Some(delta) = solve_2x2(&damped, &[-jtr[0], -jtr[1]]) else {
                    lambda *= 10.0;
                    continue;
                };
                let next_f = (f + delta[0]).clamp(low, high);
                let next_phi = wrap_phase(phi + delta[1]);
                let next_cost = samples.cost(next_f, next_phi);
                if next_cost.is_finite() && next_cost < cost {
                    let relative = (cost - next_cost) / cost.max(f64::MIN_POSITIVE);
                    f = next_f;
                    phi = next_phi;
                    cost = next_cost;
                    lambda = (lambda / 10.0).max(1e-12);
                    improved = relative > self.tolerance;
                    break;
                }
                lambda *= 10.0;
            }
            if !improved {
                break;
            }
        }
        (f, phi, cost)
    }
}

impl PeriodEstimator for HarmonicFit {
    fn estimate(&self, peaks: &PeakSequence) -> Option<PeriodEstimate> {
        let (low, high) = angular_bounds(peaks)?;
        let samples = Samples::from_peaks(peaks);
        let first = *samples.x.first()?;

        let mut distances: Vec<f64> = samples.x.windows(2).map(|w| w[1] - w[0]).collect();
        distances.sort_by(f64::total_cmp);
        let median = distances[distances.len() / 2];

        // Seeds: median spacing, then the bounds in case the median sits on a harmonic.
        let seeds = [TAU / median, high, low];
        let (f, phi, _cost) = seeds
            .iter()
            .map(|&f0| self.fit(&samples, (f0, -f0 * first), low, high))
            .min_by(|a, b| a.2.total_cmp(&b.2))?;

        if !(f.is_finite() && f > 0.0) {
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(frequency = f, phase = phi, cost = _cost, "harmonic fit converged");

        // first crest at or after x = 0
        let crest = (-phi).rem_euclid(TAU) / f;
        Some(PeriodEstimate {
            offset: Some(crest.round() as i64),
            period: TAU / f,
        })
    }

    fn weight_transform(&self) -> WeightTransform {
        WeightTransform::Sqrt
    }
}
