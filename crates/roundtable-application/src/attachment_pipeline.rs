//! Upload and enrichment of the files attached to an outgoing message.

use base64::{Engine as _, engine::general_purpose};
use roundtable_core::attachment::{
    ApiAttachment, AttachmentKind, AttachmentService, AttachmentUpload, ChatAttachment,
    PendingAttachment, ProcessingStatus, UploadedFile, is_text_extractable,
};
use std::sync::Arc;

/// Result of processing the pending attachments of one send.
///
/// Both vectors hold the successfully uploaded files in input order; failed
/// attachments appear in neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedAttachments {
    /// Shown on the user's transcript entry
    pub uploaded: Vec<ChatAttachment>,
    /// Sent to the backend with the chat request
    pub api_attachments: Vec<ApiAttachment>,
}

impl ProcessedAttachments {
    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }
}

/// Turns pending local files into uploaded, enriched attachments.
///
/// Every step is best-effort: a file that cannot be read or uploaded is
/// logged and skipped, and a failed extraction or transcription only leaves
/// the corresponding field empty. Nothing here aborts the send.
#[derive(Clone)]
pub struct AttachmentPipeline {
    service: Arc<dyn AttachmentService>,
}

impl AttachmentPipeline {
    pub fn new(service: Arc<dyn AttachmentService>) -> Self {
        Self { service }
    }

    /// Processes `pending` in order, updating each entry's status.
    ///
    /// # Arguments
    ///
    /// * `pending` - Attachments selected for the next message
    /// * `vision_enabled` - Whether images may be inlined as base64
    pub async fn process(
        &self,
        pending: &mut [PendingAttachment],
        vision_enabled: bool,
    ) -> ProcessedAttachments {
        let mut processed = ProcessedAttachments::default();

        for attachment in pending.iter_mut() {
            attachment.status = ProcessingStatus::Uploading;

            let upload = match read_upload(attachment).await {
                Ok(upload) => upload,
                Err(e) => {
                    tracing::warn!(
                        "[AttachmentPipeline] Skipping {}: cannot read {}: {}",
                        attachment.file_name,
                        attachment.path.display(),
                        e
                    );
                    attachment.status = ProcessingStatus::Error;
                    continue;
                }
            };

            let uploaded = match self.service.upload(&upload).await {
                Ok(uploaded) => uploaded,
                Err(e) => {
                    tracing::warn!(
                        "[AttachmentPipeline] Skipping {}: upload failed: {}",
                        attachment.file_name,
                        e
                    );
                    attachment.status = ProcessingStatus::Error;
                    continue;
                }
            };
            tracing::debug!(
                "[AttachmentPipeline] Uploaded {} as {}",
                attachment.file_name,
                uploaded.id
            );

            let api_attachment = self
                .enrich(attachment, &upload, &uploaded, vision_enabled)
                .await;
            processed
                .uploaded
                .push(chat_attachment(attachment, &uploaded));
            processed.api_attachments.push(api_attachment);
            attachment.status = ProcessingStatus::Done;
        }

        tracing::info!(
            "[AttachmentPipeline] Processed {}/{} attachment(s)",
            processed.len(),
            pending.len()
        );
        processed
    }

    async fn enrich(
        &self,
        attachment: &PendingAttachment,
        upload: &AttachmentUpload,
        uploaded: &UploadedFile,
        vision_enabled: bool,
    ) -> ApiAttachment {
        let mut api_attachment = ApiAttachment {
            id: uploaded.id.clone(),
            kind: attachment.kind,
            file_name: attachment.file_name.clone(),
            mime_type: attachment.mime_type.clone(),
            url: uploaded.url.clone(),
            size: uploaded.size.or(Some(upload.bytes.len() as u64)),
            base64_data: None,
            extracted_text: None,
            transcription: None,
        };

        match attachment.kind {
            AttachmentKind::Image if vision_enabled => {
                api_attachment.base64_data = Some(general_purpose::STANDARD.encode(&upload.bytes));
            }
            AttachmentKind::Audio => match self.service.transcribe(upload).await {
                Ok(text) => api_attachment.transcription = Some(text),
                Err(e) => tracing::warn!(
                    "[AttachmentPipeline] Transcription of {} failed: {}",
                    attachment.file_name,
                    e
                ),
            },
            _ if is_text_extractable(&attachment.mime_type, &attachment.file_name) => {
                match self.service.extract_text(upload).await {
                    Ok(text) => api_attachment.extracted_text = Some(text),
                    Err(e) => tracing::warn!(
                        "[AttachmentPipeline] Text extraction of {} failed: {}",
                        attachment.file_name,
                        e
                    ),
                }
            }
            _ => {}
        }

        api_attachment
    }
}

async fn read_upload(attachment: &PendingAttachment) -> std::io::Result<AttachmentUpload> {
    let bytes = tokio::fs::read(&attachment.path).await?;
    Ok(AttachmentUpload {
        file_name: attachment.file_name.clone(),
        mime_type: attachment.mime_type.clone(),
        bytes,
    })
}

fn chat_attachment(attachment: &PendingAttachment, uploaded: &UploadedFile) -> ChatAttachment {
    ChatAttachment {
        id: uploaded.id.clone(),
        kind: attachment.kind,
        file_name: attachment.file_name.clone(),
        mime_type: attachment.mime_type.clone(),
        url: uploaded.url.clone(),
        thumbnail: uploaded
            .thumbnail_url
            .clone()
            .or_else(|| attachment.preview.clone()),
    }
}
