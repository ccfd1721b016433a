//! Configuration service implementation.
//!
//! Loads the client configuration from `~/.config/roundtable/config.toml`
//! (or an explicit path) and applies environment overrides.

use crate::paths::RoundtablePaths;
use roundtable_core::config::ClientConfig;
use roundtable_core::error::{Result, RoundtableError};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "ROUNDTABLE_API_URL";
/// Overrides `api_token`.
pub const ENV_API_TOKEN: &str = "ROUNDTABLE_API_TOKEN";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file; `None` means the platform default location.
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform default config file.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading a specific file (used by `--config` and tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_file()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => RoundtablePaths::config_file()
                .map_err(|e| RoundtableError::config(e.to_string())),
        }
    }

    fn load_file(&self) -> Result<ClientConfig> {
        let path = self.config_path()?;
        if !path.exists() {
            tracing::debug!("[ConfigService] No config at {:?}, using defaults", path);
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        let config: ClientConfig = toml::from_str(&content).map_err(|e| {
            RoundtableError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::info!("[ConfigService] Loaded config from {:?}", path);
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies environment overrides on top of file values. Empty values are ignored.
pub fn apply_env_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        config.api_base_url = url;
    }
    if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
        config.api_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        let config = service.load_file().expect("defaults");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_loads_and_caches_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "max_rounds = 5\nsettings_debounce_ms = 250\n").unwrap();

        let service = ConfigService::with_path(&path);
        let config = service.get_config().unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.settings_debounce_ms, 250);

        std::fs::write(&path, "max_rounds = 9\n").unwrap();
        assert_eq!(service.get_config().unwrap().max_rounds, 5);
        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().max_rounds, 9);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "max_rounds = [oops").unwrap();

        let err = ConfigService::with_path(&path).get_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_API_URL => Some("https://coach.example.com/api".to_string()),
            ENV_API_TOKEN => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://coach.example.com/api");
        assert_eq!(config.api_token, None);
    }
}
