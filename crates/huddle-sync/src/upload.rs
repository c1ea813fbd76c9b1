//! Attachment upload collaborator.
//!
//! Files go up as a multipart form; the service answers with where it put
//! the file and what it thinks the file is.

use std::time::Duration;

use async_trait::async_trait;
use huddle_common::SyncError;
use serde::Deserialize;
use tracing::debug;

use crate::message::{format_byte_size, Attachment};

/// Default upload size cap: 10 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A local file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Build an upload, guessing the MIME type from the file extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for common chat attachments, by extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, file: FileUpload) -> Result<Attachment, SyncError>;
}

/// Where to upload and how much.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoint: String,
    pub max_bytes: u64,
}

impl UploadConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Body returned by the upload service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_url: String,
    original_name: String,
    mimetype: String,
    size: u64,
    #[serde(default)]
    is_image: Option<bool>,
}

impl From<UploadResponse> for Attachment {
    fn from(r: UploadResponse) -> Self {
        let is_image = r.is_image.unwrap_or_else(|| r.mimetype.starts_with("image/"));
        Attachment {
            url: r.file_url,
            name: r.original_name,
            mime_type: r.mimetype,
            byte_size: r.size,
            is_image,
        }
    }
}

/// Uploads over HTTP multipart.
pub struct HttpUploader {
    config: UploadConfig,
    http: reqwest::Client,
}

impl HttpUploader {
    pub fn new(config: UploadConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| SyncError::Upload(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn check_size(&self, file: &FileUpload) -> Result<(), SyncError> {
        if file.is_empty() {
            return Err(SyncError::Upload(format!("{} is empty", file.name)));
        }
        if file.len() > self.config.max_bytes {
            return Err(SyncError::Upload(format!(
                "{} is {}, the limit is {}",
                file.name,
                format_byte_size(file.len()),
                format_byte_size(self.config.max_bytes)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentUploader for HttpUploader {
    async fn upload(&self, file: FileUpload) -> Result<Attachment, SyncError> {
        self.check_size(&file)?;
        debug!(
            name = %file.name,
            mime = %file.mime_type,
            size = file.bytes.len(),
            "Uploading attachment"
        );

        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime_type)
            .map_err(|e| SyncError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SyncError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Upload(format!("HTTP {status}: {text}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Upload(format!("bad upload response: {e}")))?;
        Ok(body.into())
    }
}
