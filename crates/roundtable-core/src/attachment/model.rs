//! Attachment types: what the user picked, and the two projections the
//! pipeline derives from it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Declared attachment type, derived from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
    Audio,
    Other,
}

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/json",
    "text/plain",
    "text/markdown",
    "text/csv",
    "text/html",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "json", "txt", "md", "csv", "html", "htm",
];

impl AttachmentKind {
    /// Classifies a file by MIME type, falling back to its extension.
    pub fn classify(mime_type: &str, file_name: &str) -> Self {
        let mime = mime_type.to_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if is_text_extractable(&mime, file_name) {
            Self::Document
        } else {
            Self::Other
        }
    }
}

/// Returns true for document types the extraction service can turn into text.
pub fn is_text_extractable(mime_type: &str, file_name: &str) -> bool {
    let mime = mime_type.to_lowercase();
    if DOCUMENT_MIME_TYPES.contains(&mime.as_str()) {
        return true;
    }
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Processing status of a pending attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Uploading,
    Done,
    Error,
}

/// A file selected by the user that has not been sent yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttachment {
    pub id: String,
    pub kind: AttachmentKind,
    /// Local file backing this attachment
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub status: ProcessingStatus,
    /// Local preview reference (e.g. a `file://` URL for image thumbnails)
    pub preview: Option<String>,
}

impl PendingAttachment {
    /// Creates a pending attachment for a local file.
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        let path = path.into();
        let mime_type = mime_type.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let kind = AttachmentKind::classify(&mime_type, &file_name);
        let preview = match kind {
            AttachmentKind::Image => Some(format!("file://{}", path.display())),
            _ => None,
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            path,
            file_name,
            mime_type,
            status: ProcessingStatus::Pending,
            preview,
        }
    }
}

/// File contents handed to the attachment service endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Descriptor returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Rendering projection of a processed attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAttachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime_type: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Wire projection of a processed attachment, embedded in the chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}
