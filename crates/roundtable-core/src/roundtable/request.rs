//! Outbound chat request.

use crate::attachment::ApiAttachment;
use crate::session::{DiscussionMode, Session};
use crate::settings::{KnowledgeBaseTiming, SessionSettings};
use serde::{Deserialize, Serialize};

/// Body of the streaming chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<ApiAttachment>,
    pub max_rounds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debate_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub kb_timing: KnowledgeBaseTiming,
    pub kb_top_k: u32,
    pub kb_max_candidates: u32,
}

impl ChatRequest {
    /// Builds the request for one exchange from an effective settings snapshot.
    ///
    /// `debate_style` is only sent for free-mode sessions.
    pub fn new(
        session: &Session,
        content: impl Into<String>,
        attachments: Vec<ApiAttachment>,
        max_rounds: u32,
        settings: &SessionSettings,
    ) -> Self {
        let debate_style = match session.discussion_mode {
            DiscussionMode::Free => session.debate_style.clone(),
            DiscussionMode::Moderated => None,
        };
        let model = &settings.model;
        let kb = &settings.knowledge_base;

        Self {
            session_id: session.id.clone(),
            content: content.into(),
            attachments,
            max_rounds,
            debate_style,
            config_id: model.config_id.clone(),
            provider: model.provider.clone(),
            model: model.model.clone(),
            temperature: Some(model.temperature),
            max_tokens: Some(model.max_tokens),
            kb_timing: kb.timing,
            kb_top_k: kb.top_k,
            kb_max_candidates: kb.max_candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(mode: DiscussionMode) -> Session {
        Session {
            id: "s1".to_string(),
            title: None,
            discussion_mode: mode,
            participants: Vec::new(),
            moderator: None,
            debate_style: Some("devil_advocate".to_string()),
            is_active: true,
            settings: None,
            created_at: None,
        }
    }

    #[test]
    fn test_debate_style_only_in_free_mode() {
        let settings = SessionSettings::default();
        let free = ChatRequest::new(&session(DiscussionMode::Free), "hi", Vec::new(), 3, &settings);
        assert_eq!(free.debate_style.as_deref(), Some("devil_advocate"));

        let moderated =
            ChatRequest::new(&session(DiscussionMode::Moderated), "hi", Vec::new(), 3, &settings);
        assert!(moderated.debate_style.is_none());
        let json = serde_json::to_value(&moderated).unwrap();
        assert!(json.get("debate_style").is_none());
    }

    #[test]
    fn test_wire_shape() {
        let mut settings = SessionSettings::default();
        settings.model.model = Some("gpt-4o".to_string());
        settings.model.temperature = 0.9;
        let request = ChatRequest::new(&session(DiscussionMode::Free), "hi", Vec::new(), 2, &settings);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["session_id"], "s1");
        assert_eq!(json["max_rounds"], 2);
        assert_eq!(json["model"], "gpt-4o");
        assert!((json["temperature"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(json["kb_timing"], "off");
        assert_eq!(json["kb_top_k"], 5);
        assert!(json.get("attachments").is_none());
        assert!(json.get("provider").is_none());
    }
}
