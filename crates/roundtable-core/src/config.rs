use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SETTINGS_DEBOUNCE_MS: u64 = 600;
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Client configuration, read from `config.toml`.
///
/// Every field has a default so a partial (or missing) file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    /// Timeout for non-streaming requests (upload, sessions, ...)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Quiet window before session-setting edits are persisted
    #[serde(default = "default_settings_debounce_ms")]
    pub settings_debounce_ms: u64,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Model-name fragments of vision-capable models
    #[serde(default = "default_vision_models")]
    pub vision_models: Vec<String>,
    /// Fallback settings when a session has none persisted
    #[serde(default)]
    pub default_settings: SessionSettings,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_settings_debounce_ms() -> u64 {
    DEFAULT_SETTINGS_DEBOUNCE_MS
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

fn default_vision_models() -> Vec<String> {
    [
        "gpt-4o",
        "gpt-4.1",
        "gpt-4-turbo",
        "claude-3",
        "claude-sonnet-4",
        "claude-opus-4",
        "gemini",
        "llava",
        "qwen-vl",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            settings_debounce_ms: default_settings_debounce_ms(),
            max_rounds: default_max_rounds(),
            vision_models: default_vision_models(),
            default_settings: SessionSettings::default(),
        }
    }
}
