//! Factory profiles bundled with the library.
//!
//! These profiles are embedded at compile time and always available without
//! external files. They cover the calibrated detector setups for MARSIS AIS
//! frames and serve as starting points for user profiles.

use crate::DetectorProfile;

/// Array of factory profile names for external access.
pub static FACTORY_PROFILE_NAMES: &[&str] = &["thinning", "summing", "harmonic_fit"];

static FACTORY_PROFILES_TOML: &[(&str, &str)] = &[
    ("thinning", THINNING_PROFILE),
    ("summing", SUMMING_PROFILE),
    ("harmonic_fit", HARMONIC_FIT_PROFILE),
];

/// Skeleton-based detection with every calibration constant spelled out.
const THINNING_PROFILE: &str = r#"
name = "Thinning"
description = "Skeleton periods and echo traces for MARSIS AIS frames"

[resample]
max_samples = 1000
height_policy = "half_width"
band = { min = 0.1, max = 5.5 }
decay_reference_columns = 160
decay_span = 4

[detection]
strategy = "thinning"
horizontal_estimator = "periodogram"
vertical_estimator = "quantile_distance"
harmonic_smoothing_length = 4
harmonic_min_support = 20
harmonic_top_rows = 4
echo_strip_width = 20
echo_floor = 2e-15

[thinning.harmonic]
window = 3
min_run = 16
noise_floor = 1e-15

[thinning.echo]
window = 10
min_run = 6
noise_floor = 1e-15

[trace.ionospheric]
start_y = 20
min_support = 20
search_width = 40
search_half_height = 10
max_row_departure = 60

[trace.ground]
start_y = 0
min_support = 40
search_width = 80
search_half_height = 10
max_row_departure = 60
"#;

/// Row and column sums through the periodogram; no traces.
const SUMMING_PROFILE: &str = r#"
name = "Summing"
description = "Row and column sum periods, periodogram on both axes"

[resample]
band = { min = 0.1, max = 5.5 }

[detection]
strategy = "summing"
horizontal_estimator = "periodogram"
vertical_estimator = "periodogram"
"#;

/// Thinning with a cosine fit for the harmonic spacing.
const HARMONIC_FIT_PROFILE: &str = r#"
name = "Harmonic Fit"
description = "Thinning detector with a least-squares cosine fit on the frequency axis"

[resample]
band = { min = 0.1, max = 5.5 }

[detection]
strategy = "thinning"
horizontal_estimator = "harmonic_fit"
vertical_estimator = "quantile_distance"
"#;

/// Get all factory profiles.
///
/// # Example
///
/// ```rust
/// use iono_config::factory_profiles;
///
/// for profile in factory_profiles() {
///     println!("{}: {:?}", profile.name, profile.description);
/// }
/// ```
pub fn factory_profiles() -> Vec<DetectorProfile> {
    FACTORY_PROFILES_TOML
        .iter()
        .filter_map(|(_, toml)| DetectorProfile::from_toml(toml).ok())
        .collect()
}

/// Get a factory profile by identifier or display name, case-insensitively.
///
/// # Example
///
/// ```rust
/// use iono_config::get_factory_profile;
///
/// let profile = get_factory_profile("summing").unwrap();
/// assert_eq!(profile.name, "Summing");
/// assert!(get_factory_profile("Harmonic Fit").is_some());
/// ```
pub fn get_factory_profile(name: &str) -> Option<DetectorProfile> {
    let name_lower = name.to_lowercase();

    for (profile_name, toml) in FACTORY_PROFILES_TOML {
        if profile_name.to_lowercase() == name_lower {
            return DetectorProfile::from_toml(toml).ok();
        }
    }

    factory_profiles()
        .into_iter()
        .find(|p| p.name.to_lowercase() == name_lower)
}

/// Get the identifiers of all factory profiles.
pub fn factory_profile_names() -> Vec<&'static str> {
    FACTORY_PROFILES_TOML.iter().map(|(name, _)| *name).collect()
}

/// Check if a name refers to a factory profile (case-insensitive).
///
/// # Example
///
/// ```rust
/// use iono_config::is_factory_profile;
///
/// assert!(is_factory_profile("thinning"));
/// assert!(is_factory_profile("Harmonic Fit"));
/// assert!(!is_factory_profile("my_orbit_profile"));
/// ```
pub fn is_factory_profile(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    FACTORY_PROFILE_NAMES
        .iter()
        .any(|n| n.to_lowercase() == name_lower)
        || factory_profiles()
            .iter()
            .any(|p| p.name.to_lowercase() == name_lower)
}
