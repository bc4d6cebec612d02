use serde::{Deserialize, Serialize};

/// Handle to a file that was uploaded but not yet attached.
///
/// The bytes live in an upload staging area; the handle only carries the
/// staging token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingUpload {
    pub token: String,
}

impl PendingUpload {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Metadata recorded when an upload is staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedUploadInfo {
    pub token: String,
    pub client_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl StagedUploadInfo {
    /// Client filename without its extension.
    pub fn client_stem(&self) -> &str {
        std::path::Path::new(&self.client_filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.client_filename)
    }
}
