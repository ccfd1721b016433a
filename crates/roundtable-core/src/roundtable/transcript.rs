//! Append-only transcript with round boundaries.

use super::event::MessageType;
use super::turn::{Role, TranscriptEntry, TurnRecord};
use crate::attachment::ChatAttachment;

/// Message appended when a stream closes without producing anything.
pub const EMPTY_EXCHANGE_MESSAGE: &str = "The roundtable ended without a response.";

/// Message used when the server reports an error without any text.
pub const UNSPECIFIED_ERROR_MESSAGE: &str = "The roundtable reported an error.";

/// A speaker's finished contribution, ready to become a `TurnRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTurn {
    pub coach_id: String,
    pub coach_name: String,
    pub avatar: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub round: u32,
}

/// Builds the session transcript.
///
/// Entries are appended in the order their finalizing event arrived and are
/// never reordered or edited. A round marker precedes the first assistant
/// turn of each round within an exchange; a user message opens a new
/// exchange, so rounds restarting at 1 get fresh markers.
#[derive(Debug, Clone)]
pub struct TranscriptAssembler {
    session_id: String,
    entries: Vec<TranscriptEntry>,
    /// Round of the last marker inserted in the current exchange
    marked_round: Option<u32>,
    /// True while the latest user message has no resolving entry yet
    awaiting_resolution: bool,
}

impl TranscriptAssembler {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            entries: Vec::new(),
            marked_round: None,
            awaiting_resolution: false,
        }
    }

    /// Appends the user's message. Called at send time, before any
    /// response event is read.
    pub fn append_user(
        &mut self,
        content: impl Into<String>,
        attachments: Vec<ChatAttachment>,
        round: u32,
    ) -> &TurnRecord {
        self.marked_round = None;
        self.awaiting_resolution = true;
        let record = TurnRecord {
            id: new_id(),
            session_id: self.session_id.clone(),
            coach_id: None,
            coach_name: None,
            avatar: None,
            role: Role::User,
            content: content.into(),
            message_type: MessageType::Response,
            turn_number: round,
            attachments,
            created_at: now(),
            is_error: false,
        };
        self.push(record)
    }

    /// Appends a finalized coach or moderator turn.
    pub fn append_turn(&mut self, turn: CompletedTurn) -> &TurnRecord {
        self.mark_round(turn.round);
        self.awaiting_resolution = false;

        let record = TurnRecord {
            id: new_id(),
            session_id: self.session_id.clone(),
            coach_id: Some(turn.coach_id),
            coach_name: Some(turn.coach_name),
            avatar: turn.avatar,
            role: Role::Assistant,
            content: turn.content,
            message_type: turn.message_type,
            turn_number: turn.round,
            attachments: Vec::new(),
            created_at: now(),
            is_error: false,
        };
        self.push(record)
    }

    /// Appends the single assistant-role entry that resolves a failed exchange.
    pub fn append_error(&mut self, message: impl Into<String>, round: u32) -> &TurnRecord {
        self.mark_round(round);
        self.awaiting_resolution = false;
        let record = TurnRecord {
            id: new_id(),
            session_id: self.session_id.clone(),
            coach_id: None,
            coach_name: None,
            avatar: None,
            role: Role::Assistant,
            content: message.into(),
            message_type: MessageType::Response,
            turn_number: round,
            attachments: Vec::new(),
            created_at: now(),
            is_error: true,
        };
        self.push(record)
    }

    /// Makes sure the latest user message is followed by something.
    ///
    /// Returns the appended error entry when the exchange produced nothing.
    pub fn resolve_exchange(&mut self, round: u32) -> Option<&TurnRecord> {
        if !self.awaiting_resolution {
            return None;
        }
        tracing::warn!(
            "[TranscriptAssembler] Exchange in session {} produced no turns",
            self.session_id
        );
        Some(self.append_error(EMPTY_EXCHANGE_MESSAGE, round))
    }

    pub fn is_awaiting_resolution(&self) -> bool {
        self.awaiting_resolution
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Iterates over turns, skipping round markers.
    pub fn turns(&self) -> impl Iterator<Item = &TurnRecord> {
        self.entries.iter().filter_map(TranscriptEntry::as_turn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a marker before the first assistant entry of `round`.
    fn mark_round(&mut self, round: u32) {
        if round > 0 && self.marked_round != Some(round) {
            self.entries.push(TranscriptEntry::RoundMarker { round });
            self.marked_round = Some(round);
        }
    }

    fn push(&mut self, record: TurnRecord) -> &TurnRecord {
        self.entries.push(TranscriptEntry::Turn(record));
        match self.entries.last() {
            Some(TranscriptEntry::Turn(record)) => record,
            _ => unreachable!("a turn was just pushed"),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
