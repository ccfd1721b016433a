//! Model and knowledge-base settings attached to a roundtable session.
//!
//! `SessionSettings` is the unit the settings resolver selects wholesale:
//! a single exchange never mixes fields from different layers.

use serde::{Deserialize, Serialize};

/// Model/provider selection for an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Provider key (e.g. "openai", "anthropic"). `None` lets the backend pick.
    #[serde(default)]
    pub provider: Option<String>,
    /// Identifier of a stored provider configuration on the backend.
    #[serde(default)]
    pub config_id: Option<String>,
    /// Model name within the provider.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_stream() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: None,
            config_id: None,
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream: default_stream(),
        }
    }
}

impl ModelConfig {
    /// Returns true when the selected model accepts inline images.
    ///
    /// A model matches when its name contains one of `vision_models`
    /// (case-insensitive). Without a selected model nothing matches.
    pub fn supports_vision(&self, vision_models: &[String]) -> bool {
        let Some(model) = self.model.as_deref() else {
            return false;
        };
        let model = model.to_lowercase();
        vision_models
            .iter()
            .any(|pattern| !pattern.is_empty() && model.contains(&pattern.to_lowercase()))
    }
}

/// When retrieval-augmented context is injected into the discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBaseTiming {
    #[default]
    Off,
    /// Once per user message.
    Message,
    /// Once per round.
    Round,
    /// Before every coach turn.
    Coach,
    /// Only for the moderator.
    Moderator,
}

impl KnowledgeBaseTiming {
    /// Wire representation used by the chat request.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Message => "message",
            Self::Round => "round",
            Self::Coach => "coach",
            Self::Moderator => "moderator",
        }
    }
}

impl std::str::FromStr for KnowledgeBaseTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "message" => Ok(Self::Message),
            "round" => Ok(Self::Round),
            "coach" => Ok(Self::Coach),
            "moderator" => Ok(Self::Moderator),
            other => Err(format!("unknown knowledge-base timing '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    #[serde(default)]
    pub timing: KnowledgeBaseTiming,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: u32,
}

fn default_top_k() -> u32 {
    5
}

fn default_max_candidates() -> u32 {
    20
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            timing: KnowledgeBaseTiming::default(),
            top_k: default_top_k(),
            max_candidates: default_max_candidates(),
        }
    }
}

/// Complete per-exchange configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_filled_from_partial_json() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{"model":{"model":"gpt-4o"}}"#).unwrap();
        assert_eq!(settings.model.model.as_deref(), Some("gpt-4o"));
        assert_eq!(settings.model.temperature, 0.7);
        assert!(settings.model.stream);
        assert_eq!(settings.knowledge_base, KnowledgeBaseConfig::default());
    }

    #[test]
    fn test_supports_vision_matches_case_insensitively() {
        let patterns = vec!["gpt-4o".to_string(), "claude-3".to_string()];
        let mut model = ModelConfig {
            model: Some("GPT-4o-mini".to_string()),
            ..ModelConfig::default()
        };
        assert!(model.supports_vision(&patterns));

        model.model = Some("gpt-3.5-turbo".to_string());
        assert!(!model.supports_vision(&patterns));

        model.model = None;
        assert!(!model.supports_vision(&patterns));
    }

    #[test]
    fn test_timing_round_trips_through_str() {
        for timing in [
            KnowledgeBaseTiming::Off,
            KnowledgeBaseTiming::Message,
            KnowledgeBaseTiming::Round,
            KnowledgeBaseTiming::Coach,
            KnowledgeBaseTiming::Moderator,
        ] {
            assert_eq!(timing.as_str().parse::<KnowledgeBaseTiming>(), Ok(timing));
        }
        assert!("weekly".parse::<KnowledgeBaseTiming>().is_err());
    }
}
