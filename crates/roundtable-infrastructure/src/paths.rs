//! Path management for roundtable configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/roundtable/        # Config directory (platform default)
//! └── config.toml              # Client configuration
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "roundtable";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct RoundtablePaths;

impl RoundtablePaths {
    /// Returns the roundtable configuration directory (e.g. `~/.config/roundtable/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
