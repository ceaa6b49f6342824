//! Settings directory and bundled default files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::SettingsError;

pub const SETTINGS_FILENAME: &str = "sqltools_settings.json";
pub const CONNECTIONS_FILENAME: &str = "sqltools_connections.json";

/// Settings written on first run.
pub const DEFAULT_SETTINGS: &str = include_str!("../../defaults/sqltools_settings.json");

/// Connections written on first run.
pub const DEFAULT_CONNECTIONS: &str = include_str!("../../defaults/sqltools_connections.json");

/// Resolve the writable settings directory.
///
/// Searches in order:
/// 1. Environment variable `SQLTOOLS_CONFIG_DIR`
/// 2. `<user config dir>/sqltools`
pub fn settings_dir() -> Result<PathBuf, SettingsError> {
    if let Ok(dir) = env::var("SQLTOOLS_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("sqltools"))
        .ok_or_else(|| SettingsError::InvalidConfig("no user configuration directory".to_string()))
}

/// Return the path of `name` inside `dir`, writing `default_contents` there
/// first if the file does not exist.
pub fn ensure_file(dir: &Path, name: &str, default_contents: &str) -> Result<PathBuf, SettingsError> {
    let path = dir.join(name);
    if !path.exists() {
        fs::create_dir_all(dir)?;
        fs::write(&path, default_contents)?;
        tracing::debug!(path = %path.display(), "wrote default config file");
    }
    Ok(path)
}
