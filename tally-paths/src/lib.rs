//! XDG Base Directory paths for tally.
//!
//! The CLI and server resolve config and data locations through XDG paths on
//! every platform, the way gh and kubectl do, rather than platform-native ones.

use std::path::{Path, PathBuf};

const APP: &str = "tally";

/// Resolve `<xdg>/tally`, else `<home>/<fallback>/tally`, else a relative path.
fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>, fallback: &str) -> PathBuf {
    match (xdg, home) {
        (Some(base), _) => base.join(APP),
        (None, Some(home)) => home.join(fallback).join(APP),
        (None, None) => Path::new(fallback).join(APP),
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the tally config directory.
///
/// Returns `$XDG_CONFIG_HOME/tally` if set, otherwise `~/.config/tally`.
///
/// # Examples
///
/// ```
/// use tally_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    resolve(env_path("XDG_CONFIG_HOME"), dirs::home_dir(), ".config")
}

/// Get the tally data directory.
///
/// Returns `$XDG_DATA_HOME/tally` if set, otherwise `~/.local/share/tally`.
pub fn data_dir() -> PathBuf {
    resolve(env_path("XDG_DATA_HOME"), dirs::home_dir(), ".local/share")
}

/// User-level config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default location of the touchpoint database.
pub fn default_database_path() -> PathBuf {
    data_dir().join("tally.db")
}
