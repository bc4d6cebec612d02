use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mediafield_core::models::{MediaOwner, MediaRecord, NewMediaOptions};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::keys::{join_url, key_to_path, media_path};
use crate::record;
use crate::traits::{MediaStore, StorageError, StorageResult};
use crate::StoreBackend;

const MANIFEST_FILE: &str = "media.json";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Manifest {
    next_id: i64,
    records: Vec<MediaRecord>,
}

/// Local filesystem media store
///
/// Records are kept in a JSON manifest at the root; file bytes live under
/// `{root}/{disk}/{id}/{file_name}`.
pub struct LocalMediaStore {
    base_path: PathBuf,
    base_url: String,
    manifest: Mutex<Manifest>,
}

impl LocalMediaStore {
    /// Open (or create) a store rooted at `base_path`
    ///
    /// # Arguments
    /// * `base_path` - Root directory (e.g., "/var/lib/mediafield")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let manifest_path = base_path.join(MANIFEST_FILE);
        let manifest = if fs::try_exists(&manifest_path).await.unwrap_or(false) {
            let raw = fs::read(&manifest_path).await?;
            serde_json::from_slice(&raw)?
        } else {
            Manifest::default()
        };

        tracing::debug!(
            path = %base_path.display(),
            records = manifest.records.len(),
            "Opened local media store"
        );

        Ok(LocalMediaStore {
            base_path,
            base_url,
            manifest: Mutex::new(manifest),
        })
    }

    fn file_path(&self, record: &MediaRecord) -> StorageResult<PathBuf> {
        key_to_path(
            &self.base_path,
            &format!("{}/{}", record.disk, media_path(record, None)),
        )
    }

    /// Write the manifest to a temporary file then rename it over the old one.
    async fn persist(&self, manifest: &Manifest) -> StorageResult<()> {
        let path = self.base_path.join(MANIFEST_FILE);
        let tmp = self.base_path.join(format!("{}.tmp", MANIFEST_FILE));
        let data = serde_json::to_vec_pretty(manifest)?;

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Persist `next`, then make it the live manifest. The live manifest is
    /// left as is when persisting fails.
    async fn commit(&self, live: &mut Manifest, next: Manifest) -> StorageResult<()> {
        self.persist(&next).await?;
        *live = next;
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::CreateFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(data).await.map_err(|e| {
            StorageError::CreateFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::CreateFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn list_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
    ) -> StorageResult<Vec<MediaRecord>> {
        let manifest = self.manifest.lock().await;
        Ok(record::collection_records(
            &manifest.records,
            owner,
            collection,
        ))
    }

    async fn find_media(
        &self,
        owner: &MediaOwner,
        uuid: Uuid,
    ) -> StorageResult<Option<MediaRecord>> {
        let manifest = self.manifest.lock().await;
        Ok(manifest
            .records
            .iter()
            .find(|r| &r.owner == owner && r.uuid == uuid)
            .cloned())
    }

    #[tracing::instrument(skip(self, owner, data, options), fields(owner = %owner, size_bytes = data.len()))]
    async fn create_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
        data: Vec<u8>,
        options: NewMediaOptions,
    ) -> StorageResult<MediaRecord> {
        let start = std::time::Instant::now();
        let mut manifest = self.manifest.lock().await;

        let id = manifest.next_id + 1;
        let order_column = record::next_order_column(&manifest.records, owner, collection);
        let created = record::build_record(
            id,
            owner,
            collection,
            data.len() as u64,
            order_column,
            options,
        );

        let path = self.file_path(&created)?;
        self.ensure_parent_dir(&path).await?;

        let mut next = manifest.clone();
        next.next_id = id;
        next.records.push(created.clone());

        let written = match self.write_file(&path, &data).await {
            Ok(()) => self.commit(&mut manifest, next).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            uuid = %created.uuid,
            size_bytes = created.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store create successful"
        );

        Ok(created)
    }

    #[tracing::instrument(skip(self, record), fields(uuid = %record.uuid))]
    async fn delete_media(&self, record: &MediaRecord) -> StorageResult<()> {
        let mut manifest = self.manifest.lock().await;

        let path = self.file_path(record)?;

        if manifest.records.iter().any(|r| r.id == record.id) {
            let mut next = manifest.clone();
            next.records.retain(|r| r.id != record.id);
            self.commit(&mut manifest, next).await?;
        }

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if let Some(dir) = path.parent() {
                // Leaves the directory in place when conversions are still there
                let _ = fs::remove_dir(dir).await;
            }
        }

        tracing::info!(path = %path.display(), "Local store delete successful");
        Ok(())
    }

    async fn set_order(&self, order: &[(Uuid, i64)]) -> StorageResult<()> {
        let mut manifest = self.manifest.lock().await;
        let mut next = manifest.clone();
        let changed = record::apply_order(&mut next.records, order);
        if changed > 0 {
            self.commit(&mut manifest, next).await?;
        }
        tracing::debug!(
            requested = order.len(),
            changed = changed,
            "Local store applied order"
        );
        Ok(())
    }

    async fn resolve_ids(&self, uuids: &[Uuid]) -> StorageResult<HashMap<Uuid, i64>> {
        let manifest = self.manifest.lock().await;
        Ok(record::resolve_ids(&manifest.records, uuids))
    }

    async fn read_media(&self, record: &MediaRecord) -> StorageResult<Vec<u8>> {
        let path = self.file_path(record)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.display().to_string()));
        }
        fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    fn url(&self, record: &MediaRecord, conversion: Option<&str>) -> StorageResult<String> {
        Ok(join_url(&self.base_url, &media_path(record, conversion)))
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Local
    }
}
