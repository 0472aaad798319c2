//! XDG Base Directory paths for architect.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths. This matches tools like gh, docker, kubectl.

use std::path::PathBuf;

/// Application directory name under the XDG base directories.
pub const APP_DIR: &str = "architect";

/// File name of both the user and the project configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the project configuration directory.
pub const PROJECT_CONFIG_DIR_ENV: &str = "ARCHITECT_PROJECT_CONFIG_DIR";

/// Get the architect config directory.
///
/// Returns `$XDG_CONFIG_HOME/architect` if set, otherwise `~/.config/architect`.
///
/// # Examples
///
/// ```
/// use architect_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("architect"));
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join(APP_DIR)
    } else {
        PathBuf::from(".config").join(APP_DIR)
    }
}

/// Path of the per-user configuration file.
pub fn user_config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Directory holding the project configuration.
///
/// `.architect` relative to the working directory, unless
/// `ARCHITECT_PROJECT_CONFIG_DIR` points elsewhere (used by isolated tests).
pub fn project_config_dir() -> PathBuf {
    match std::env::var(PROJECT_CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(".architect"),
    }
}

/// Path of the project configuration file.
pub fn project_config_file() -> PathBuf {
    project_config_dir().join(CONFIG_FILE)
}
