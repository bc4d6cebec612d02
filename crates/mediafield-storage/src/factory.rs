#[cfg(feature = "storage-local")]
use crate::{LocalMediaStore, LocalUploadStaging};
use crate::{MediaStore, MemoryMediaStore, MemoryUploadStaging, StorageResult, UploadStaging};
#[cfg(not(feature = "storage-local"))]
use crate::StorageError;
use crate::StoreBackend;
use mediafield_core::Config;
use std::sync::Arc;

/// The pair of collaborators a synchronization engine is built from.
#[derive(Clone)]
pub struct Stores {
    pub media: Arc<dyn MediaStore>,
    pub staging: Arc<dyn UploadStaging>,
}

/// Create the media store and staging area selected by configuration
pub async fn create_stores(config: &Config) -> StorageResult<Stores> {
    match config.storage_backend {
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory media store");
            Ok(Stores {
                media: Arc::new(MemoryMediaStore::new(config.base_url.clone())),
                staging: Arc::new(MemoryUploadStaging::new()),
            })
        }

        #[cfg(feature = "storage-local")]
        StoreBackend::Local => {
            let media = LocalMediaStore::new(&config.storage_path, config.base_url.clone()).await?;
            let staging = LocalUploadStaging::new(&config.staging_path).await?;
            Ok(Stores {
                media: Arc::new(media),
                staging: Arc::new(staging),
            })
        }

        #[cfg(not(feature = "storage-local"))]
        StoreBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend() {
        let config = Config {
            storage_backend: StoreBackend::Memory,
            ..Config::default()
        };
        let stores = create_stores(&config).await.unwrap();
        assert_eq!(stores.media.backend_type(), StoreBackend::Memory);
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn test_local_backend_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_backend: StoreBackend::Local,
            storage_path: dir.path().join("media"),
            staging_path: dir.path().join("staging"),
            ..Config::default()
        };
        let stores = create_stores(&config).await.unwrap();
        assert_eq!(stores.media.backend_type(), StoreBackend::Local);
        assert!(dir.path().join("media").is_dir());
        assert!(dir.path().join("staging").is_dir());
    }
}
