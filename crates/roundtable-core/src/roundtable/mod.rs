//! Roundtable streaming domain.
//!
//! # Module Structure
//!
//! - `event`: Server event union (`ServerEvent`, `MessageType`)
//! - `turn`: Transcript entries (`TurnRecord`, `TranscriptEntry`)
//! - `transcript`: Append-only transcript builder (`TranscriptAssembler`)
//! - `state_machine`: Per-exchange speaker state (`TurnStateMachine`)
//! - `request`: Outbound chat request (`ChatRequest`)
//! - `transport`: Trait for opening the event stream

mod event;
mod request;
mod state_machine;
mod transcript;
mod transport;
mod turn;

pub use event::{MessageType, ServerEvent};
pub use request::ChatRequest;
pub use state_machine::{Flow, StreamingBuffer, TurnStateMachine};
pub use transcript::{
    CompletedTurn, EMPTY_EXCHANGE_MESSAGE, TranscriptAssembler, UNSPECIFIED_ERROR_MESSAGE,
};
pub use transport::{ByteStream, RoundtableTransport};
pub use turn::{Role, TranscriptEntry, TurnRecord};
