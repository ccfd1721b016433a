//! Application layer for the Roundtable client.
//!
//! Coordinates the core domain types with the remote collaborators to run
//! one exchange at a time: attachment enrichment, settings resolution and
//! the streaming turn loop.

pub mod attachment_pipeline;
pub mod roundtable_service;
pub mod settings;

pub use attachment_pipeline::{AttachmentPipeline, ProcessedAttachments};
pub use roundtable_service::{ExchangeOutcome, RoundtableService, RoundtableUpdate};
pub use settings::{DebouncedSettingsWriter, SessionSettingsResolver, SettingsLayer};
