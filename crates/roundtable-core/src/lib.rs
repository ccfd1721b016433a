//! Domain layer of the Roundtable client.
//!
//! Holds the models exchanged with the backend, the collaborator traits the
//! other layers implement, and the pure streaming state: the
//! [`roundtable::TurnStateMachine`] and the [`roundtable::TranscriptAssembler`].

pub mod attachment;
pub mod config;
pub mod error;
pub mod roundtable;
pub mod session;
pub mod settings;

// Re-export common error type
pub use error::{Result, RoundtableError};
