//! Platform-specific paths for detector profiles.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/iono/` (Linux), `~/Library/Application Support/iono/` (macOS), `%APPDATA%\iono\` (Windows)
//! - **User profiles**: the `profiles/` subdirectory of the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use iono_config::paths;
//!
//! println!("User profiles: {:?}", paths::user_profiles_dir());
//!
//! if let Some(path) = paths::find_profile("night_side") {
//!     println!("Found profile at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "iono";

/// Subdirectory name for profiles.
const PROFILES_SUBDIR: &str = "profiles";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific profiles directory.
pub fn user_profiles_dir() -> PathBuf {
    user_config_dir().join(PROFILES_SUBDIR)
}

/// Find a profile file by name.
///
/// `name` may be a path to an existing file, or a profile name (with or
/// without `.toml`) looked up in [`user_profiles_dir`].
pub fn find_profile(name: &str) -> Option<PathBuf> {
    find_profile_in(name, &user_profiles_dir())
}

/// [`find_profile`] against an explicit profiles directory.
pub fn find_profile_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{}.toml", name)
    };

    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Ensure the user profiles directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_profiles_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_profiles_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// List all profile files in the user profiles directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_profiles() -> Vec<PathBuf> {
    list_profiles_in_dir(&user_profiles_dir())
}

/// List the `.toml` files in `dir`, sorted by path.
pub fn list_profiles_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut profiles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    profiles.sort();
    profiles
}

/// Get the profile name from a file path.
///
/// # Example
///
/// ```rust
/// use iono_config::paths::profile_name_from_path;
/// use std::path::Path;
///
/// let name = profile_name_from_path(Path::new("/path/to/night_side.toml"));
/// assert_eq!(name, Some("night_side".to_string()));
/// ```
pub fn profile_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_dirs() {
        assert!(user_config_dir().to_string_lossy().contains("iono"));
        assert!(user_profiles_dir().ends_with("iono/profiles"));
    }

    #[test]
    fn test_find_profile_in_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("orbit.toml");
        fs::write(&file, "name = \"orbit\"").unwrap();

        assert_eq!(find_profile_in("orbit", temp.path()), Some(file.clone()));
        assert_eq!(find_profile_in("orbit.toml", temp.path()), Some(file.clone()));
        assert_eq!(find_profile_in(file.to_str().unwrap(), Path::new("/nonexistent")), Some(file));
        assert_eq!(find_profile_in("missing", temp.path()), None);
    }

    #[test]
    fn test_list_profiles_in_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.toml"), "").unwrap();
        fs::write(temp.path().join("a.toml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("sub.toml")).unwrap();

        let listed = list_profiles_in_dir(temp.path());
        let names: Vec<_> = listed.iter().filter_map(|p| profile_name_from_path(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        assert!(list_profiles_in_dir(Path::new("/definitely/not/here")).is_empty());
    }
}
