//! Detector profiles for iono-analysis.
//!
//! A profile collects every tunable of the resample → detect pipeline in one
//! TOML file: grid size and gap filling, detection strategy and estimators,
//! thinning windows and tracer search boxes.
//!
//! # Features
//!
//! - **Profiles**: Load and save [`DetectorProfile`]s as TOML
//! - **Validation**: Range checks for every tunable
//! - **Factory Profiles**: Calibrated setups embedded in the library
//! - **Paths**: Platform-specific profile directories (`std` feature)
//!
//! # Example
//!
//! ```rust
//! use iono_config::{DetectorProfile, get_factory_profile};
//! use iono_analysis::{Detector, EstimatorKind, Resampler};
//!
//! let mut profile = get_factory_profile("thinning").unwrap();
//! profile.detection.horizontal_estimator = EstimatorKind::HarmonicFit;
//! profile.validate().unwrap();
//!
//! let resampler = Resampler::new(profile.resample_options());
//! let detector = Detector::new(profile.detector_config());
//!
//! let text = profile.to_toml().unwrap();
//! assert_eq!(DetectorProfile::from_toml(&text).unwrap(), profile);
//! ```

mod error;
mod profile;

/// Platform-specific paths for profiles.
#[cfg(feature = "std")]
pub mod paths;

/// Profile validation.
pub mod validation;

/// Factory profiles bundled with the library.
pub mod factory_profiles;

pub use error::ConfigError;
pub use factory_profiles::{
    FACTORY_PROFILE_NAMES, factory_profile_names, factory_profiles, get_factory_profile,
    is_factory_profile,
};
#[cfg(feature = "std")]
pub use paths::{
    ensure_user_profiles_dir, find_profile, list_user_profiles, profile_name_from_path,
    user_config_dir, user_profiles_dir,
};
pub use profile::{
    DetectionSection, DetectorProfile, ResampleSection, ThinningSection, ThinningSections,
    TraceSections,
};
pub use validation::{ValidationError, ValidationResult, validate_profile};

/// Resolve `name` to a validated profile.
///
/// A user profile file (see [`paths::find_profile`]) takes precedence over a
/// factory profile of the same name.
pub fn load_profile(name: &str) -> Result<DetectorProfile, ConfigError> {
    #[cfg(feature = "std")]
    if let Some(path) = paths::find_profile(name) {
        let profile = DetectorProfile::load(path)?;
        profile.validate()?;
        return Ok(profile);
    }

    let profile =
        get_factory_profile(name).ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;
    profile.validate()?;
    Ok(profile)
}
