//! Turn state machine driven by roundtable stream events.
//!
//! Events are applied strictly one at a time by the single consumer of the
//! stream, so the state needs no synchronization.

use super::event::{MessageType, ServerEvent};
use super::transcript::{CompletedTurn, TranscriptAssembler, UNSPECIFIED_ERROR_MESSAGE};
use std::collections::HashMap;

/// Content accumulated for a speaker whose turn is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingBuffer {
    pub coach_id: String,
    pub coach_name: String,
    pub avatar: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub is_streaming: bool,
}

impl StreamingBuffer {
    fn new(
        coach_id: String,
        coach_name: String,
        avatar: Option<String>,
        message_type: MessageType,
    ) -> Self {
        Self {
            coach_id,
            coach_name,
            avatar,
            content: String::new(),
            message_type,
            is_streaming: true,
        }
    }
}

/// Whether the consumer should keep reading the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The exchange finished; `error` carries the server message on failure.
    Stop { error: Option<String> },
}

/// Per-exchange speaker state.
#[derive(Debug, Default)]
pub struct TurnStateMachine {
    current_round: u32,
    active_speakers: HashMap<String, StreamingBuffer>,
    current_speaker: Option<String>,
    finalized: usize,
}

impl TurnStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event, handing finalized turns to `transcript`.
    pub fn apply(&mut self, event: ServerEvent, transcript: &mut TranscriptAssembler) -> Flow {
        match event {
            ServerEvent::RoundStart { round } => {
                if round < self.current_round {
                    tracing::warn!(
                        "[TurnStateMachine] Ignoring round_start {} after round {}",
                        round,
                        self.current_round
                    );
                } else {
                    tracing::debug!("[TurnStateMachine] Round {} started", round);
                    self.current_round = round;
                }
                Flow::Continue
            }
            ServerEvent::CoachStart {
                coach_id,
                name,
                avatar,
            } => {
                self.start_speaker(coach_id, name, avatar, MessageType::Response);
                Flow::Continue
            }
            ServerEvent::ModeratorStart {
                coach_id,
                name,
                avatar,
                message_type,
            } => {
                self.start_speaker(coach_id, name, avatar, message_type);
                Flow::Continue
            }
            ServerEvent::Content { coach_id, content } => {
                self.append_content(&coach_id, &content);
                Flow::Continue
            }
            ServerEvent::CoachEnd { coach_id } => {
                self.finalize(&coach_id, None, transcript);
                Flow::Continue
            }
            ServerEvent::ModeratorEnd {
                coach_id,
                message_type,
            } => {
                self.finalize(&coach_id, message_type, transcript);
                Flow::Continue
            }
            ServerEvent::RoundEnd { .. } => {
                tracing::debug!("[TurnStateMachine] Round {} ended", self.current_round);
                Flow::Continue
            }
            ServerEvent::Done => {
                self.discard_open_buffers("done");
                Flow::Stop { error: None }
            }
            ServerEvent::Error { message } => {
                self.discard_open_buffers("error");
                let message = if message.trim().is_empty() {
                    UNSPECIFIED_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                transcript.append_error(message.clone(), self.current_round);
                Flow::Stop {
                    error: Some(message),
                }
            }
        }
    }

    /// Drops every unfinished buffer without producing transcript entries.
    ///
    /// Used for terminal events and when the transport fails mid-stream.
    pub fn discard_open_buffers(&mut self, reason: &str) {
        if self.active_speakers.is_empty() {
            return;
        }
        for buffer in self.active_speakers.values() {
            tracing::warn!(
                "[TurnStateMachine] Discarding unfinished turn of {} ({} chars) on {}",
                buffer.coach_id,
                buffer.content.len(),
                reason
            );
        }
        self.active_speakers.clear();
        self.current_speaker = None;
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_speaker(&self) -> Option<&str> {
        self.current_speaker.as_deref()
    }

    pub fn buffer(&self, coach_id: &str) -> Option<&StreamingBuffer> {
        self.active_speakers.get(coach_id)
    }

    pub fn active_speakers(&self) -> impl Iterator<Item = &StreamingBuffer> {
        self.active_speakers.values()
    }

    /// Number of turns finalized in this exchange.
    pub fn finalized_count(&self) -> usize {
        self.finalized
    }

    fn start_speaker(
        &mut self,
        coach_id: String,
        name: String,
        avatar: Option<String>,
        message_type: MessageType,
    ) {
        let buffer = StreamingBuffer::new(coach_id.clone(), name, avatar, message_type);
        if let Some(previous) = self.active_speakers.insert(coach_id.clone(), buffer) {
            tracing::warn!(
                "[TurnStateMachine] {} started again before ending; dropping {} buffered chars",
                previous.coach_id,
                previous.content.len()
            );
        }
        self.current_speaker = Some(coach_id);
    }

    fn append_content(&mut self, coach_id: &str, delta: &str) {
        match self.active_speakers.get_mut(coach_id) {
            Some(buffer) => buffer.content.push_str(delta),
            None => tracing::debug!(
                "[TurnStateMachine] Content for {} without an open turn ignored",
                coach_id
            ),
        }
    }

    fn finalize(
        &mut self,
        coach_id: &str,
        message_type: Option<MessageType>,
        transcript: &mut TranscriptAssembler,
    ) {
        let Some(buffer) = self.active_speakers.remove(coach_id) else {
            tracing::debug!("[TurnStateMachine] End for {} without a start ignored", coach_id);
            return;
        };
        if self.current_speaker.as_deref() == Some(coach_id) {
            self.current_speaker = None;
        }

        transcript.append_turn(CompletedTurn {
            coach_id: buffer.coach_id,
            coach_name: buffer.coach_name,
            avatar: buffer.avatar,
            content: buffer.content,
            message_type: message_type.unwrap_or(buffer.message_type),
            round: self.current_round,
        });
        self.finalized += 1;
    }
}
