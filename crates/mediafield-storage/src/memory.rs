use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mediafield_core::models::{MediaOwner, MediaRecord, NewMediaOptions};
use uuid::Uuid;

use crate::keys::{join_url, media_path};
use crate::record;
use crate::traits::{MediaStore, StorageError, StorageResult};
use crate::StoreBackend;

#[derive(Default)]
struct MemoryState {
    records: Vec<MediaRecord>,
    files: HashMap<i64, Vec<u8>>,
    next_id: i64,
}

/// In-memory media store.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryMediaStore {
    state: Arc<Mutex<MemoryState>>,
    base_url: String,
    temporary_urls: bool,
    rejected_owner_types: Arc<HashSet<String>>,
}

impl MemoryMediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            base_url: base_url.into(),
            temporary_urls: false,
            rejected_owner_types: Arc::new(HashSet::new()),
        }
    }

    /// Enable signing of temporary URLs.
    pub fn with_temporary_urls(mut self, enabled: bool) -> Self {
        self.temporary_urls = enabled;
        self
    }

    /// Owners of this model type cannot have media attached.
    pub fn rejecting_owner_type(mut self, model_type: impl Into<String>) -> Self {
        let mut rejected = (*self.rejected_owner_types).clone();
        rejected.insert(model_type.into());
        self.rejected_owner_types = Arc::new(rejected);
        self
    }

    /// Record that a conversion has been generated for a record.
    pub fn mark_conversion_generated(&self, uuid: Uuid, conversion: &str) -> StorageResult<()> {
        let mut state = self.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.uuid == uuid)
            .ok_or_else(|| StorageError::NotFound(uuid.to_string()))?;
        record
            .generated_conversions
            .insert(conversion.to_string(), true);
        Ok(())
    }

    /// Number of records across every owner and collection.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryMediaStore {
    fn default() -> Self {
        Self::new("http://localhost/media")
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn list_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
    ) -> StorageResult<Vec<MediaRecord>> {
        let state = self.lock();
        Ok(record::collection_records(&state.records, owner, collection))
    }

    async fn find_media(
        &self,
        owner: &MediaOwner,
        uuid: Uuid,
    ) -> StorageResult<Option<MediaRecord>> {
        let state = self.lock();
        Ok(state
            .records
            .iter()
            .find(|r| &r.owner == owner && r.uuid == uuid)
            .cloned())
    }

    async fn create_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
        data: Vec<u8>,
        options: NewMediaOptions,
    ) -> StorageResult<MediaRecord> {
        if !self.accepts_media(owner) {
            return Err(StorageError::CreateFailed(format!(
                "{} cannot have media attached",
                owner
            )));
        }

        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        let order_column = record::next_order_column(&state.records, owner, collection);
        let created = record::build_record(
            id,
            owner,
            collection,
            data.len() as u64,
            order_column,
            options,
        );

        state.files.insert(id, data);
        state.records.push(created.clone());

        tracing::debug!(
            id = id,
            uuid = %created.uuid,
            collection = %collection,
            size_bytes = created.size_bytes,
            "Memory store created media"
        );

        Ok(created)
    }

    async fn delete_media(&self, record: &MediaRecord) -> StorageResult<()> {
        let mut state = self.lock();
        state.records.retain(|r| r.id != record.id);
        state.files.remove(&record.id);
        Ok(())
    }

    async fn set_order(&self, order: &[(Uuid, i64)]) -> StorageResult<()> {
        let mut state = self.lock();
        let changed = record::apply_order(&mut state.records, order);
        tracing::debug!(
            requested = order.len(),
            changed = changed,
            "Memory store applied order"
        );
        Ok(())
    }

    async fn resolve_ids(&self, uuids: &[Uuid]) -> StorageResult<HashMap<Uuid, i64>> {
        let state = self.lock();
        Ok(record::resolve_ids(&state.records, uuids))
    }

    async fn read_media(&self, record: &MediaRecord) -> StorageResult<Vec<u8>> {
        self.lock()
            .files
            .get(&record.id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("media {}", record.id)))
    }

    fn url(&self, record: &MediaRecord, conversion: Option<&str>) -> StorageResult<String> {
        Ok(join_url(&self.base_url, &media_path(record, conversion)))
    }

    async fn temporary_url(
        &self,
        record: &MediaRecord,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if !self.temporary_urls {
            return Err(StorageError::TemporaryUrlUnsupported(StoreBackend::Memory));
        }
        let expires_at = Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!(
            "{}?expires={}",
            join_url(&self.base_url, &media_path(record, None)),
            expires_at
        ))
    }

    fn accepts_media(&self, owner: &MediaOwner) -> bool {
        !self.rejected_owner_types.contains(&owner.model_type)
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(name: &str) -> NewMediaOptions {
        NewMediaOptions {
            file_name: name.to_string(),
            display_name: name.to_string(),
            mime_type: "text/plain".to_string(),
            target_disk: "public".to_string(),
            ..NewMediaOptions::default()
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let store = MemoryMediaStore::default();
        let owner = MediaOwner::new("post", "1");

        let a = store
            .create_media(&owner, "docs", b"a".to_vec(), options("a.txt"))
            .await
            .unwrap();
        let b = store
            .create_media(&owner, "docs", b"bb".to_vec(), options("b.txt"))
            .await
            .unwrap();
        store
            .create_media(&owner, "other", b"c".to_vec(), options("c.txt"))
            .await
            .unwrap();

        let listed = store.list_media(&owner, "docs").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].uuid, a.uuid);
        assert_eq!(listed[1].order_column, 2);
        assert_eq!(b.size_bytes, 2);

        store.delete_media(&a).await.unwrap();
        store.delete_media(&a).await.unwrap();
        assert_eq!(store.list_media(&owner, "docs").await.unwrap().len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_temporary_url_support() {
        let owner = MediaOwner::new("post", "1");

        let store = MemoryMediaStore::default();
        let record = store
            .create_media(&owner, "docs", b"a".to_vec(), options("a.txt"))
            .await
            .unwrap();
        assert!(matches!(
            store.temporary_url(&record, Duration::from_secs(60)).await,
            Err(StorageError::TemporaryUrlUnsupported(StoreBackend::Memory))
        ));

        let store = MemoryMediaStore::default().with_temporary_urls(true);
        let record = store
            .create_media(&owner, "docs", b"a".to_vec(), options("a.txt"))
            .await
            .unwrap();
        let url = store
            .temporary_url(&record, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("?expires="));
    }

    #[tokio::test]
    async fn test_rejected_owner_type() {
        let store = MemoryMediaStore::default().rejecting_owner_type("comment");
        let owner = MediaOwner::new("comment", "9");
        assert!(!store.accepts_media(&owner));
        assert!(store
            .create_media(&owner, "docs", b"a".to_vec(), options("a.txt"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_conversion_url() {
        let store = MemoryMediaStore::new("http://cdn/media");
        let owner = MediaOwner::new("post", "1");
        let record = store
            .create_media(&owner, "docs", b"a".to_vec(), options("photo.png"))
            .await
            .unwrap();

        assert_eq!(
            store.url(&record, None).unwrap(),
            format!("http://cdn/media/{}/photo.png", record.id)
        );
        assert_eq!(
            store.url(&record, Some("thumb")).unwrap(),
            format!("http://cdn/media/{}/conversions/photo-thumb.png", record.id)
        );
    }
}
