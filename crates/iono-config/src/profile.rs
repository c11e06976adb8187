//! Detector profile file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use iono_analysis::detect::{EchoLineSettings, HarmonicLineSettings};
use iono_analysis::resample::{DECAY_REFERENCE_COLUMNS, DECAY_SPAN, DEFAULT_MAX_SAMPLES};
use iono_analysis::thinning::DEFAULT_NOISE_FLOOR;
use iono_analysis::{
    Axis, BatchRunner, DetectionStrategy, DetectorConfig, EstimatorKind, FrequencyBand, HeightPolicy,
    ResampleOptions, ThinningParams, TraceSettings,
};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_profile};

/// Every tunable of the resample → detect pipeline, stored as TOML.
///
/// All sections may be omitted and take their defaults. Within `[resample]`
/// and `[detection]` individual keys may be omitted too. The paired
/// `[thinning.*]` and `[trace.*]` sections each have their own defaults, so a
/// section that is present must list all of its keys.
///
/// # TOML Format
///
/// ```toml
/// name = "Thinning"
/// description = "Skeleton periods and echo traces"
///
/// [resample]
/// max_samples = 1000
/// height_policy = "half_width"
/// band = { min = 0.1, max = 5.5 }
///
/// [detection]
/// strategy = "thinning"
/// horizontal_estimator = "periodogram"
/// vertical_estimator = "quantile_distance"
///
/// [thinning.harmonic]
/// window = 3
/// min_run = 16
/// noise_floor = 1e-15
///
/// [trace.ground]
/// start_y = 0
/// min_support = 40
/// search_width = 80
/// search_half_height = 10
/// max_row_departure = 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorProfile {
    /// Name of the profile.
    pub name: String,

    /// Optional description of the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output grid shape and gap filling.
    #[serde(default)]
    pub resample: ResampleSection,

    /// Strategy, estimators and line selection.
    #[serde(default)]
    pub detection: DetectionSection,

    /// The two thinning passes.
    #[serde(default)]
    pub thinning: ThinningSections,

    /// The two echo tracers.
    #[serde(default)]
    pub trace: TraceSections,
}

/// `[resample]`: mirrors [`ResampleOptions`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResampleSection {
    /// Fixed output width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    /// Fixed output height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    /// Cap for the computed width.
    pub max_samples: usize,
    /// Height rule when no height is fixed.
    pub height_policy: HeightPolicy,
    /// Band mapped onto the grid; the span of the input columns when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<FrequencyBand>,
    /// Column count whose spacing is the decay window unit.
    pub decay_reference_columns: usize,
    /// Decay window length in those units.
    pub decay_span: usize,
}

impl Default for ResampleSection {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            max_samples: DEFAULT_MAX_SAMPLES,
            height_policy: HeightPolicy::HalfWidth,
            band: None,
            decay_reference_columns: DECAY_REFERENCE_COLUMNS,
            decay_span: DECAY_SPAN,
        }
    }
}

impl ResampleSection {
    /// The section as resampler options.
    pub fn to_options(&self) -> ResampleOptions {
        ResampleOptions {
            width: self.width,
            height: self.height,
            max_samples: self.max_samples,
            height_policy: self.height_policy,
            band: self.band,
            decay_reference_columns: self.decay_reference_columns,
            decay_span: self.decay_span,
        }
    }
}

impl From<&ResampleOptions> for ResampleSection {
    fn from(o: &ResampleOptions) -> Self {
        Self {
            width: o.width,
            height: o.height,
            max_samples: o.max_samples,
            height_policy: o.height_policy,
            band: o.band,
            decay_reference_columns: o.decay_reference_columns,
            decay_span: o.decay_span,
        }
    }
}

/// `[detection]`: strategy, estimators and the line selection constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSection {
    /// Detection strategy.
    pub strategy: DetectionStrategy,
    /// Estimator for the frequency-axis period.
    pub horizontal_estimator: EstimatorKind,
    /// Estimator for the delay-axis period.
    pub vertical_estimator: EstimatorKind,
    /// Columns a weak harmonic line may be merged across.
    pub harmonic_smoothing_length: usize,
    /// Support below which a harmonic line must reach the top rows.
    pub harmonic_min_support: usize,
    /// Top rows that exempt a short harmonic line.
    pub harmonic_top_rows: usize,
    /// Leftmost columns an echo must be visible in.
    pub echo_strip_width: usize,
    /// Value an echo must exceed within the strip.
    pub echo_floor: f32,
}

impl Default for DetectionSection {
    fn default() -> Self {
        let config = DetectorConfig::default();
        Self {
            strategy: config.strategy,
            horizontal_estimator: config.horizontal_estimator,
            vertical_estimator: config.vertical_estimator,
            harmonic_smoothing_length: config.harmonic_lines.smoothing_length,
            harmonic_min_support: config.harmonic_lines.min_support,
            harmonic_top_rows: config.harmonic_lines.top_rows,
            echo_strip_width: config.echo_lines.strip_width,
            echo_floor: config.echo_lines.echo_floor,
        }
    }
}

/// One thinning pass; the suppression axis is fixed by the section name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThinningSection {
    /// Half-width of the suppression window in bins.
    pub window: usize,
    /// Shortest run kept along the other axis.
    pub min_run: usize,
    /// Background level.
    #[serde(default = "default_noise_floor")]
    pub noise_floor: f32,
}

fn default_noise_floor() -> f32 {
    DEFAULT_NOISE_FLOOR
}

impl ThinningSection {
    /// Harmonic-line pass defaults.
    pub fn harmonic() -> Self {
        ThinningParams::harmonic().into()
    }

    /// Echo-band pass defaults.
    pub fn echo() -> Self {
        ThinningParams::echo().into()
    }

    /// Parameters for a pass suppressing along `axis`.
    pub fn params(&self, axis: Axis) -> ThinningParams {
        ThinningParams {
            axis,
            window: self.window,
            min_run: self.min_run,
            noise_floor: self.noise_floor,
        }
    }
}

impl From<ThinningParams> for ThinningSection {
    fn from(p: ThinningParams) -> Self {
        Self {
            window: p.window,
            min_run: p.min_run,
            noise_floor: p.noise_floor,
        }
    }
}

/// `[thinning.harmonic]` and `[thinning.echo]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThinningSections {
    /// Frequency-axis pass isolating harmonic lines.
    #[serde(default = "ThinningSection::harmonic")]
    pub harmonic: ThinningSection,
    /// Delay-axis pass isolating echo bands.
    #[serde(default = "ThinningSection::echo")]
    pub echo: ThinningSection,
}

impl Default for ThinningSections {
    fn default() -> Self {
        Self {
            harmonic: ThinningSection::harmonic(),
            echo: ThinningSection::echo(),
        }
    }
}

/// `[trace.ionospheric]` and `[trace.ground]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TraceSections {
    /// Tracer over the low-frequency half.
    #[serde(default = "TraceSettings::ionospheric")]
    pub ionospheric: TraceSettings,
    /// Tracer over the high-frequency half.
    #[serde(default = "TraceSettings::ground")]
    pub ground: TraceSettings,
}

impl Default for TraceSections {
    fn default() -> Self {
        Self {
            ionospheric: TraceSettings::ionospheric(),
            ground: TraceSettings::ground(),
        }
    }
}

impl DetectorProfile {
    /// Create a profile with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resample: ResampleSection::default(),
            detection: DetectionSection::default(),
            thinning: ThinningSections::default(),
            trace: TraceSections::default(),
        }
    }

    /// Capture existing resampler options and detector configuration.
    pub fn from_config(name: impl Into<String>, options: &ResampleOptions, config: &DetectorConfig) -> Self {
        Self {
            name: name.into(),
            description: None,
            resample: options.into(),
            detection: DetectionSection {
                strategy: config.strategy,
                horizontal_estimator: config.horizontal_estimator,
                vertical_estimator: config.vertical_estimator,
                harmonic_smoothing_length: config.harmonic_lines.smoothing_length,
                harmonic_min_support: config.harmonic_lines.min_support,
                harmonic_top_rows: config.harmonic_lines.top_rows,
                echo_strip_width: config.echo_lines.strip_width,
                echo_floor: config.echo_lines.echo_floor,
            },
            thinning: ThinningSections {
                harmonic: config.harmonic_thinning.into(),
                echo: config.echo_thinning.into(),
            },
            trace: TraceSections {
                ionospheric: config.ionospheric_trace,
                ground: config.ground_trace,
            },
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let profile: DetectorProfile = toml::from_str(&content)?;
        Ok(profile)
    }

    /// Load a profile from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the profile to a TOML file, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the profile to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every tunable.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_profile(self)
    }

    /// Resampler options of this profile.
    pub fn resample_options(&self) -> ResampleOptions {
        self.resample.to_options()
    }

    /// Detector configuration of this profile.
    pub fn detector_config(&self) -> DetectorConfig {
        let d = &self.detection;
        DetectorConfig {
            strategy: d.strategy,
            horizontal_estimator: d.horizontal_estimator,
            vertical_estimator: d.vertical_estimator,
            harmonic_thinning: self.thinning.harmonic.params(Axis::Frequency),
            echo_thinning: self.thinning.echo.params(Axis::Delay),
            harmonic_lines: HarmonicLineSettings {
                smoothing_length: d.harmonic_smoothing_length,
                min_support: d.harmonic_min_support,
                top_rows: d.harmonic_top_rows,
            },
            echo_lines: EchoLineSettings {
                strip_width: d.echo_strip_width,
                echo_floor: d.echo_floor,
            },
            ionospheric_trace: self.trace.ionospheric,
            ground_trace: self.trace.ground,
        }
    }

    /// Validate, then build a batch runner from this profile.
    pub fn batch_runner(&self) -> Result<BatchRunner, ConfigError> {
        self.validate()?;
        Ok(BatchRunner::new(self.resample_options(), self.detector_config()))
    }
}

impl Default for DetectorProfile {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
