//! HTTP implementation of [`AttachmentService`] (multipart endpoints).

use crate::client::{ApiClient, send_json};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use roundtable_core::attachment::{AttachmentService, AttachmentUpload, UploadedFile};
use roundtable_core::error::{Result, RoundtableError};
use serde::Deserialize;

const UPLOAD_PATH: &str = "files/upload";
const EXTRACT_PATH: &str = "files/extract";
const TRANSCRIBE_PATH: &str = "files/transcribe";

#[derive(Clone, Debug)]
pub struct HttpAttachmentService {
    api: ApiClient,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(alias = "extracted_text", alias = "content")]
    text: String,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(alias = "transcription")]
    text: String,
}

impl HttpAttachmentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn form(file: &AttachmentUpload) -> Result<Form> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                RoundtableError::invalid_input(format!(
                    "Invalid MIME type '{}' for {}: {}",
                    file.mime_type, file.file_name, e
                ))
            })?;
        Ok(Form::new().part("file", part))
    }
}

#[async_trait]
impl AttachmentService for HttpAttachmentService {
    async fn upload(&self, file: &AttachmentUpload) -> Result<UploadedFile> {
        let form = Self::form(file)?;
        send_json(self.api.request(Method::POST, UPLOAD_PATH).multipart(form)).await
    }

    async fn extract_text(&self, file: &AttachmentUpload) -> Result<String> {
        let form = Self::form(file)?;
        let response: ExtractResponse =
            send_json(self.api.request(Method::POST, EXTRACT_PATH).multipart(form)).await?;
        Ok(response.text)
    }

    async fn transcribe(&self, file: &AttachmentUpload) -> Result<String> {
        let form = Self::form(file)?;
        let response: TranscribeResponse =
            send_json(self.api.request(Method::POST, TRANSCRIBE_PATH).multipart(form)).await?;
        Ok(response.text)
    }
}
