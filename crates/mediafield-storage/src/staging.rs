//! Upload staging areas
//!
//! Uploads are staged under a random token until the form that received them
//! is saved. Staged uploads can expire at any time; callers must check
//! [`UploadStaging::exists`] before relying on them.

use std::collections::HashMap;
#[cfg(feature = "storage-local")]
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mediafield_core::models::{PendingUpload, StagedUploadInfo};
#[cfg(feature = "storage-local")]
use tokio::fs;
use uuid::Uuid;

#[cfg(feature = "storage-local")]
use crate::keys::key_to_path;
use crate::traits::{StorageError, StorageResult, UploadStaging};

/// In-memory staging area. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryUploadStaging {
    uploads: Arc<Mutex<HashMap<String, (StagedUploadInfo, Vec<u8>)>>>,
}

impl MemoryUploadStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a staged upload as if it had expired.
    pub fn expire(&self, upload: &PendingUpload) {
        self.lock().remove(&upload.token);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (StagedUploadInfo, Vec<u8>)>> {
        self.uploads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UploadStaging for MemoryUploadStaging {
    async fn stage(
        &self,
        data: Vec<u8>,
        client_filename: &str,
        mime_type: &str,
    ) -> StorageResult<PendingUpload> {
        let token = Uuid::new_v4().to_string();
        let info = StagedUploadInfo {
            token: token.clone(),
            client_filename: client_filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: data.len() as u64,
        };
        self.lock().insert(token.clone(), (info, data));
        Ok(PendingUpload::new(token))
    }

    async fn exists(&self, upload: &PendingUpload) -> StorageResult<bool> {
        Ok(self.lock().contains_key(&upload.token))
    }

    async fn info(&self, upload: &PendingUpload) -> StorageResult<StagedUploadInfo> {
        self.lock()
            .get(&upload.token)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| StorageError::NotFound(upload.token.clone()))
    }

    async fn bytes(&self, upload: &PendingUpload) -> StorageResult<Vec<u8>> {
        self.lock()
            .get(&upload.token)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StorageError::NotFound(upload.token.clone()))
    }

    async fn discard(&self, upload: &PendingUpload) -> StorageResult<()> {
        self.lock().remove(&upload.token);
        Ok(())
    }
}

/// Filesystem staging area: `{base}/{token}` holds the bytes and
/// `{base}/{token}.json` the upload metadata.
#[cfg(feature = "storage-local")]
#[derive(Clone)]
pub struct LocalUploadStaging {
    base_path: PathBuf,
}

#[cfg(feature = "storage-local")]
impl LocalUploadStaging {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self { base_path })
    }

    fn data_path(&self, token: &str) -> StorageResult<PathBuf> {
        key_to_path(&self.base_path, token)
    }

    fn info_path(&self, token: &str) -> StorageResult<PathBuf> {
        key_to_path(&self.base_path, &format!("{}.json", token))
    }
}

#[cfg(feature = "storage-local")]
#[async_trait]
impl UploadStaging for LocalUploadStaging {
    async fn stage(
        &self,
        data: Vec<u8>,
        client_filename: &str,
        mime_type: &str,
    ) -> StorageResult<PendingUpload> {
        let token = Uuid::new_v4().to_string();
        let info = StagedUploadInfo {
            token: token.clone(),
            client_filename: client_filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: data.len() as u64,
        };

        fs::write(self.data_path(&token)?, &data).await?;
        fs::write(self.info_path(&token)?, serde_json::to_vec(&info)?).await?;

        tracing::debug!(
            token = %token,
            client_filename = %client_filename,
            size_bytes = info.size_bytes,
            "Staged upload"
        );

        Ok(PendingUpload::new(token))
    }

    async fn exists(&self, upload: &PendingUpload) -> StorageResult<bool> {
        let data = fs::try_exists(self.data_path(&upload.token)?).await?;
        let info = fs::try_exists(self.info_path(&upload.token)?).await?;
        Ok(data && info)
    }

    async fn info(&self, upload: &PendingUpload) -> StorageResult<StagedUploadInfo> {
        let path = self.info_path(&upload.token)?;
        let raw = fs::read(&path)
            .await
            .map_err(|_| StorageError::NotFound(upload.token.clone()))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn bytes(&self, upload: &PendingUpload) -> StorageResult<Vec<u8>> {
        let path = self.data_path(&upload.token)?;
        fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    async fn discard(&self, upload: &PendingUpload) -> StorageResult<()> {
        for path in [
            self.data_path(&upload.token)?,
            self.info_path(&upload.token)?,
        ] {
            if fs::try_exists(&path).await.unwrap_or(false) {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}
