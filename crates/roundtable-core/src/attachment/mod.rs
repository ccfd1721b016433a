//! Attachment domain module.

mod model;
mod service;

pub use model::{
    ApiAttachment, AttachmentKind, AttachmentUpload, ChatAttachment, PendingAttachment,
    ProcessingStatus, UploadedFile, is_text_extractable,
};
pub use service::AttachmentService;
