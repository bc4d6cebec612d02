//! Recording store wrappers for tests
//!
//! [`RecordingMediaStore`] forwards to a [`MemoryMediaStore`] and remembers
//! every mutating call so tests can assert on the exact collaborator traffic.
//! Individual operations can be made to fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediafield_core::models::{MediaOwner, MediaRecord, NewMediaOptions};
use uuid::Uuid;

use crate::traits::{MediaStore, StorageError, StorageResult};
use crate::{MemoryMediaStore, StoreBackend};

/// A mutating call observed by [`RecordingMediaStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { collection: String },
    Create { collection: String, file_name: String },
    Delete { uuid: Uuid },
    SetOrder(Vec<(Uuid, i64)>),
    Resolve(Vec<Uuid>),
}

#[derive(Default)]
struct Failures {
    list: bool,
    resolve: bool,
    set_order: bool,
    deletes: HashSet<Uuid>,
    creates: HashSet<String>,
}

#[derive(Clone)]
pub struct RecordingMediaStore {
    inner: MemoryMediaStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl RecordingMediaStore {
    pub fn new(inner: MemoryMediaStore) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Failures::default())),
        }
    }

    pub fn inner(&self) -> &MemoryMediaStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Create { .. }))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Delete { .. }))
    }

    pub fn resolve_count(&self) -> usize {
        self.count(|c| matches!(c, StoreCall::Resolve(_)))
    }

    /// Arguments of every `set_order` call, oldest first.
    pub fn set_order_calls(&self) -> Vec<Vec<(Uuid, i64)>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                StoreCall::SetOrder(order) => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_list(&self, fail: bool) {
        self.failures.lock().unwrap().list = fail;
    }

    pub fn fail_resolve(&self, fail: bool) {
        self.failures.lock().unwrap().resolve = fail;
    }

    pub fn fail_set_order(&self, fail: bool) {
        self.failures.lock().unwrap().set_order = fail;
    }

    pub fn fail_delete_of(&self, uuid: Uuid) {
        self.failures.lock().unwrap().deletes.insert(uuid);
    }

    /// Fail creation of records whose stored file name matches.
    pub fn fail_create_of(&self, file_name: impl Into<String>) {
        self.failures.lock().unwrap().creates.insert(file_name.into());
    }

    fn count(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn list_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
    ) -> StorageResult<Vec<MediaRecord>> {
        self.record(StoreCall::List {
            collection: collection.to_string(),
        });
        if self.failures.lock().unwrap().list {
            return Err(StorageError::BackendError("list unavailable".to_string()));
        }
        self.inner.list_media(owner, collection).await
    }

    async fn find_media(
        &self,
        owner: &MediaOwner,
        uuid: Uuid,
    ) -> StorageResult<Option<MediaRecord>> {
        self.inner.find_media(owner, uuid).await
    }

    async fn create_media(
        &self,
        owner: &MediaOwner,
        collection: &str,
        data: Vec<u8>,
        options: NewMediaOptions,
    ) -> StorageResult<MediaRecord> {
        self.record(StoreCall::Create {
            collection: collection.to_string(),
            file_name: options.file_name.clone(),
        });
        if self.failures.lock().unwrap().creates.contains(&options.file_name) {
            return Err(StorageError::CreateFailed(options.file_name));
        }
        self.inner.create_media(owner, collection, data, options).await
    }

    async fn delete_media(&self, record: &MediaRecord) -> StorageResult<()> {
        self.record(StoreCall::Delete { uuid: record.uuid });
        if self.failures.lock().unwrap().deletes.contains(&record.uuid) {
            return Err(StorageError::DeleteFailed(record.uuid.to_string()));
        }
        self.inner.delete_media(record).await
    }

    async fn set_order(&self, order: &[(Uuid, i64)]) -> StorageResult<()> {
        self.record(StoreCall::SetOrder(order.to_vec()));
        if self.failures.lock().unwrap().set_order {
            return Err(StorageError::BackendError("set_order unavailable".to_string()));
        }
        self.inner.set_order(order).await
    }

    async fn resolve_ids(&self, uuids: &[Uuid]) -> StorageResult<HashMap<Uuid, i64>> {
        self.record(StoreCall::Resolve(uuids.to_vec()));
        if self.failures.lock().unwrap().resolve {
            return Err(StorageError::BackendError("resolve unavailable".to_string()));
        }
        self.inner.resolve_ids(uuids).await
    }

    async fn read_media(&self, record: &MediaRecord) -> StorageResult<Vec<u8>> {
        self.inner.read_media(record).await
    }

    fn url(&self, record: &MediaRecord, conversion: Option<&str>) -> StorageResult<String> {
        self.inner.url(record, conversion)
    }

    async fn temporary_url(
        &self,
        record: &MediaRecord,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.temporary_url(record, expires_in).await
    }

    fn accepts_media(&self, owner: &MediaOwner) -> bool {
        self.inner.accepts_media(owner)
    }

    fn backend_type(&self) -> StoreBackend {
        self.inner.backend_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_and_failures() {
        let store = RecordingMediaStore::new(MemoryMediaStore::default());
        let owner = MediaOwner::new("post", "1");
        let options = NewMediaOptions {
            file_name: "a.txt".to_string(),
            display_name: "a".to_string(),
            mime_type: "text/plain".to_string(),
            target_disk: "public".to_string(),
            ..NewMediaOptions::default()
        };

        let record = store
            .create_media(&owner, "docs", b"a".to_vec(), options)
            .await
            .unwrap();
        store.fail_delete_of(record.uuid);
        assert!(store.delete_media(&record).await.is_err());
        store.set_order(&[(record.uuid, record.id)]).await.unwrap();

        assert_eq!(store.create_count(), 1);
        assert_eq!(store.delete_count(), 1);
        assert_eq!(store.set_order_calls(), vec![vec![(record.uuid, record.id)]]);
        assert_eq!(store.inner().len(), 1);
    }
}
