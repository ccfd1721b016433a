//! Attachment service trait (upload / extract / transcribe endpoints).

use super::model::{AttachmentUpload, UploadedFile};
use crate::error::Result;
use async_trait::async_trait;

/// The three independent file endpoints used before a turn is sent.
///
/// Each call is a single attempt; callers decide how to degrade.
#[async_trait]
pub trait AttachmentService: Send + Sync {
    /// Stores the file and returns its descriptor.
    async fn upload(&self, file: &AttachmentUpload) -> Result<UploadedFile>;

    /// Extracts plain text from a document.
    async fn extract_text(&self, file: &AttachmentUpload) -> Result<String>;

    /// Transcribes an audio file.
    async fn transcribe(&self, file: &AttachmentUpload) -> Result<String>;
}
