//! Profile validation.
//!
//! Every tunable of a [`DetectorProfile`] has an accepted range. Validation
//! checks all of them and reports every violation, not just the first.
//!
//! # Example
//!
//! ```rust
//! use iono_config::{DetectorProfile, ValidationError, validate_profile};
//!
//! let mut profile = DetectorProfile::new("broken");
//! profile.thinning.harmonic.window = 0;
//! profile.trace.ground.search_width = 0;
//!
//! match validate_profile(&profile) {
//!     Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use thiserror::Error;

use iono_analysis::{FrequencyBand, TraceSettings};

use crate::profile::{DetectorProfile, ThinningSection};

/// Largest grid dimension a profile may request.
pub const MAX_GRID_SIZE: usize = 100_000;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The profile has no name.
    #[error("profile name is empty")]
    EmptyName,

    /// Integer tunable out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the tunable.
        field: String,
        /// The value that was out of range.
        value: usize,
        /// Minimum allowed value.
        min: usize,
        /// Maximum allowed value.
        max: usize,
    },

    /// Floating-point tunable negative or not finite.
    #[error("'{field}' value {value} must be finite and non-negative")]
    InvalidLevel {
        /// Dotted path of the tunable.
        field: String,
        /// The offending value.
        value: f64,
    },

    /// Frequency band empty, inverted or not finite.
    #[error("band [{min}, {max}] is not a valid frequency range")]
    InvalidBand {
        /// Lower edge.
        min: f64,
        /// Upper edge.
        max: f64,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Default)]
struct Checks {
    errors: Vec<ValidationError>,
}

impl Checks {
    fn range(&mut self, field: &str, value: usize, min: usize, max: usize) {
        if !(min..=max).contains(&value) {
            self.errors.push(ValidationError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            });
        }
    }

    fn level(&mut self, field: &str, value: f64) {
        if !(value.is_finite() && value >= 0.0) {
            self.errors.push(ValidationError::InvalidLevel {
                field: field.to_string(),
                value,
            });
        }
    }

    fn band(&mut self, band: FrequencyBand) {
        if band.validate().is_err() {
            self.errors.push(ValidationError::InvalidBand {
                min: band.min,
                max: band.max,
            });
        }
    }

    fn thinning(&mut self, section: &str, t: &ThinningSection) {
        self.range(&format!("thinning.{section}.window"), t.window, 1, MAX_GRID_SIZE);
        self.range(&format!("thinning.{section}.min_run"), t.min_run, 1, MAX_GRID_SIZE);
        self.level(&format!("thinning.{section}.noise_floor"), f64::from(t.noise_floor));
    }

    fn trace(&mut self, section: &str, t: &TraceSettings) {
        self.range(&format!("trace.{section}.start_y"), t.start_y, 0, MAX_GRID_SIZE);
        self.range(&format!("trace.{section}.min_support"), t.min_support, 1, MAX_GRID_SIZE);
        self.range(&format!("trace.{section}.search_width"), t.search_width, 1, MAX_GRID_SIZE);
        self.range(
            &format!("trace.{section}.search_half_height"),
            t.search_half_height,
            0,
            MAX_GRID_SIZE,
        );
        self.range(
            &format!("trace.{section}.max_row_departure"),
            t.max_row_departure,
            0,
            MAX_GRID_SIZE,
        );
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

/// Check every tunable of `profile`.
///
/// A single violation is returned as itself; several come back as
/// [`ValidationError::Multiple`].
pub fn validate_profile(profile: &DetectorProfile) -> ValidationResult<()> {
    let mut checks = Checks::default();

    if profile.name.trim().is_empty() {
        checks.errors.push(ValidationError::EmptyName);
    }

    let r = &profile.resample;
    if let Some(width) = r.width {
        checks.range("resample.width", width, 1, MAX_GRID_SIZE);
    }
    if let Some(height) = r.height {
        checks.range("resample.height", height, 1, MAX_GRID_SIZE);
    }
    checks.range("resample.max_samples", r.max_samples, 1, MAX_GRID_SIZE);
    checks.range("resample.decay_reference_columns", r.decay_reference_columns, 1, MAX_GRID_SIZE);
    checks.range("resample.decay_span", r.decay_span, 0, MAX_GRID_SIZE);
    if let Some(band) = r.band {
        checks.band(band);
    }

    let d = &profile.detection;
    checks.range("detection.harmonic_smoothing_length", d.harmonic_smoothing_length, 0, MAX_GRID_SIZE);
    checks.range("detection.harmonic_min_support", d.harmonic_min_support, 1, MAX_GRID_SIZE);
    checks.range("detection.harmonic_top_rows", d.harmonic_top_rows, 0, MAX_GRID_SIZE);
    checks.range("detection.echo_strip_width", d.echo_strip_width, 1, MAX_GRID_SIZE);
    checks.level("detection.echo_floor", f64::from(d.echo_floor));

    checks.thinning("harmonic", &profile.thinning.harmonic);
    checks.thinning("echo", &profile.thinning.echo);
    checks.trace("ionospheric", &profile.trace.ionospheric);
    checks.trace("ground", &profile.trace.ground);

    checks.finish()
}
