//! Roundtable session domain model.

use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};

/// How the backend runs the discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionMode {
    /// Coaches talk freely; a debate style may shape the exchange.
    #[default]
    Free,
    /// A dedicated moderator opens, summarizes and closes rounds.
    Moderated,
}

impl std::str::FromStr for DiscussionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "moderated" => Ok(Self::Moderated),
            other => Err(format!("unknown discussion mode '{other}'")),
        }
    }
}

/// A coach taking part in a roundtable (either a participant or the moderator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coach {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A roundtable session as returned by the session service.
///
/// The client only mutates a session through the settings-patch call and
/// the explicit end action; everything else is read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub discussion_mode: DiscussionMode,
    /// Participant coaches in speaking order
    #[serde(default)]
    pub participants: Vec<Coach>,
    #[serde(default)]
    pub moderator: Option<Coach>,
    /// Debate style; only sent to the backend in free mode
    #[serde(default)]
    pub debate_style: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Persisted settings; `None` until the user saves any
    #[serde(default)]
    pub settings: Option<SessionSettings>,
    /// Timestamp when the session was created (ISO 8601 format)
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Session {
    /// Looks up a coach (participant or moderator) by id.
    pub fn coach(&self, coach_id: &str) -> Option<&Coach> {
        self.participants
            .iter()
            .chain(self.moderator.iter())
            .find(|coach| coach.id == coach_id)
    }
}

/// Payload for creating a new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub discussion_mode: DiscussionMode,
    pub coach_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debate_style: Option<String>,
}
