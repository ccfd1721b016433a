//! Transcript entries.

use super::event::MessageType;
use crate::attachment::ChatAttachment;
use serde::{Deserialize, Serialize};

/// Author role of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One finalized contribution to the transcript.
///
/// Records are created by the transcript assembler only and never change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: String,
    pub session_id: String,
    /// `None` for user turns and error entries
    pub coach_id: Option<String>,
    #[serde(default)]
    pub coach_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub role: Role,
    pub content: String,
    pub message_type: MessageType,
    /// Round this turn belongs to
    pub turn_number: u32,
    #[serde(default)]
    pub attachments: Vec<ChatAttachment>,
    /// Timestamp when the turn was finalized (ISO 8601 format)
    pub created_at: String,
    /// Marks the single entry that resolves a failed exchange
    #[serde(default)]
    pub is_error: bool,
}

/// An item of the rendered transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// Boundary shown before the first turn of a round
    RoundMarker { round: u32 },
    Turn(TurnRecord),
}

impl TranscriptEntry {
    pub fn as_turn(&self) -> Option<&TurnRecord> {
        match self {
            Self::Turn(turn) => Some(turn),
            Self::RoundMarker { .. } => None,
        }
    }
}
