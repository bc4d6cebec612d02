//! Collaborator traits
//!
//! The synchronization engine only ever talks to a [`MediaStore`] and an
//! [`UploadStaging`] area; both are injected at construction.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use mediafield_core::models::{
    MediaOwner, MediaRecord, NewMediaOptions, PendingUpload, StagedUploadInfo,
};
use mediafield_core::{StoreBackend, SyncError};
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Create failed: {0}")]
    CreateFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Temporary URLs are not supported by the {0} backend")]
    TemporaryUrlUnsupported(StoreBackend),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => SyncError::NotFound(what),
            StorageError::TemporaryUrlUnsupported(backend) => {
                SyncError::UnsupportedTemporaryUrl(backend.to_string())
            }
            StorageError::ConfigError(msg) => SyncError::InvalidConfig(msg),
            other => SyncError::Storage(other.to_string()),
        }
    }
}

/// Persistent store of media records.
///
/// Records are partitioned by owner and collection name. `order_column`
/// defines display order within a partition.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// All records of `owner` in `collection`, ordered by `order_column`.
    async fn list_media(&self, owner: &MediaOwner, collection: &str)
        -> StorageResult<Vec<MediaRecord>>;

    /// Any record of `owner` with the given uuid, whatever its collection.
    async fn find_media(&self, owner: &MediaOwner, uuid: Uuid)
        -> StorageResult<Option<MediaRecord>>;

    /// Store `data` as a new record appended to the end of `collection`.
    async fn create_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
        data: Vec<u8>,
        options: NewMediaOptions,
    ) -> StorageResult<MediaRecord>;

    /// Delete a record and its file. Deleting an already-deleted record succeeds.
    async fn delete_media(&self, record: &MediaRecord) -> StorageResult<()>;

    /// Rewrite `order_column` to `1..=n` following the given sequence.
    async fn set_order(&self, order: &[(Uuid, i64)]) -> StorageResult<()>;

    /// Map uuids to internal ids in one lookup. Unknown uuids are absent from the result.
    async fn resolve_ids(&self, uuids: &[Uuid]) -> StorageResult<HashMap<Uuid, i64>>;

    /// Read back the stored bytes of a record.
    async fn read_media(&self, record: &MediaRecord) -> StorageResult<Vec<u8>>;

    /// Permanent URL of a record, or of one of its conversions.
    fn url(&self, record: &MediaRecord, conversion: Option<&str>) -> StorageResult<String>;

    /// Signed URL valid for `expires_in`. Backends that cannot sign return
    /// [`StorageError::TemporaryUrlUnsupported`].
    async fn temporary_url(
        &self,
        _record: &MediaRecord,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::TemporaryUrlUnsupported(self.backend_type()))
    }

    /// Whether `owner` can have media attached at all.
    fn accepts_media(&self, _owner: &MediaOwner) -> bool {
        true
    }

    /// Get the store backend type
    fn backend_type(&self) -> StoreBackend;
}

/// Holding area for uploads that have not been attached yet.
#[async_trait]
pub trait UploadStaging: Send + Sync {
    /// Stage `data` and return a handle to it.
    async fn stage(
        &self,
        data: Vec<u8>,
        client_filename: &str,
        mime_type: &str,
    ) -> StorageResult<PendingUpload>;

    /// Whether the staged bytes are still retrievable.
    async fn exists(&self, upload: &PendingUpload) -> StorageResult<bool>;

    async fn info(&self, upload: &PendingUpload) -> StorageResult<StagedUploadInfo>;

    async fn bytes(&self, upload: &PendingUpload) -> StorageResult<Vec<u8>>;

    async fn mime_type(&self, upload: &PendingUpload) -> StorageResult<String> {
        Ok(self.info(upload).await?.mime_type)
    }

    async fn original_client_filename(&self, upload: &PendingUpload) -> StorageResult<String> {
        Ok(self.info(upload).await?.client_filename)
    }

    /// Remove a staged upload. Discarding a missing upload succeeds.
    async fn discard(&self, upload: &PendingUpload) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_to_sync_error() {
        let err: SyncError = StorageError::NotFound("media 1".into()).into();
        assert!(matches!(err, SyncError::NotFound(_)));

        let err: SyncError = StorageError::TemporaryUrlUnsupported(StoreBackend::Local).into();
        assert!(matches!(err, SyncError::UnsupportedTemporaryUrl(ref b) if b == "local"));

        let err: SyncError = StorageError::DeleteFailed("busy".into()).into();
        assert!(matches!(err, SyncError::Storage(_)));
    }
}
