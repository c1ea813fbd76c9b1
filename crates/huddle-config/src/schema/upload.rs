use serde::{Deserialize, Serialize};

/// Attachment upload service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSection {
    pub endpoint: String,
    /// Largest file accepted for upload, in bytes.
    pub max_bytes: u64,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3001/upload".to_string(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}
