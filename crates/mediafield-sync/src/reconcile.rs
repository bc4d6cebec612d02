//! Reconciliation of a field's desired state against the media store.
//!
//! One call runs three phases in order: delete abandoned records, create
//! records from pending uploads, then persist the desired order. Failures are
//! isolated to the item (or phase) they happen in; whatever succeeded stays
//! committed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use mediafield_core::{
    DesiredState, EvaluationContext, FieldConfig, MediaOwner, MediaRecord, PendingUpload,
    SyncError,
};
use mediafield_processing::{sanitize_filename, TransformPipeline};
use mediafield_storage::{MediaStore, StorageError, UploadStaging};
use uuid::Uuid;

const DEFAULT_DISK: &str = "public";

/// What a reconciliation did.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Desired state with every created upload replaced by its record.
    pub state: DesiredState,
    pub deleted: Vec<Uuid>,
    pub created: Vec<Uuid>,
    /// Keys of pending entries that were not turned into records.
    pub skipped: Vec<String>,
    /// Persisted entries left out of the order because they could not be resolved.
    pub unresolved: Vec<Uuid>,
    /// The `(uuid, id)` sequence handed to the store.
    pub order: Vec<(Uuid, i64)>,
    /// Every error handled along the way, in the order it happened.
    pub errors: Vec<SyncError>,
}

impl ReconcileOutcome {
    fn new(state: DesiredState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// True when nothing was deleted or created.
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.created.is_empty()
    }

    fn record_error(&mut self, err: SyncError, context: &str) {
        err.log(context);
        self.errors.push(err);
    }
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn MediaStore>,
    staging: Arc<dyn UploadStaging>,
    pipeline: TransformPipeline,
    default_disk: String,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn MediaStore>, staging: Arc<dyn UploadStaging>) -> Self {
        Self {
            store,
            staging,
            pipeline: TransformPipeline::default(),
            default_disk: DEFAULT_DISK.to_string(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Disk used when the field does not name one.
    pub fn with_default_disk(mut self, disk: impl Into<String>) -> Self {
        self.default_disk = disk.into();
        self
    }

    /// Bring the records of `field` for `owner` in line with `state`.
    ///
    /// Never fails as a whole: per-item and per-phase errors are logged and
    /// collected in [`ReconcileOutcome::errors`].
    #[tracing::instrument(skip(self, field, owner, state), fields(owner = %owner, entries = state.len()))]
    pub async fn reconcile(
        &self,
        field: &FieldConfig,
        owner: &MediaOwner,
        state: DesiredState,
    ) -> ReconcileOutcome {
        let start = Instant::now();
        let ctx = EvaluationContext::new(Some(owner));
        let collection = field.get_collection(&ctx);
        let mut outcome = ReconcileOutcome::new(state);

        let mut known = self
            .delete_abandoned(field, owner, &collection, &mut outcome)
            .await;
        self.create_pending(field, owner, &collection, &mut outcome)
            .await;
        if let Some(known) = known.as_mut() {
            known.extend(outcome.created.iter().copied());
        }

        match known {
            Some(known) => self.persist_order(&known, &mut outcome).await,
            None => tracing::warn!(
                collection = %collection,
                "Collection could not be listed, order unchanged"
            ),
        }

        tracing::info!(
            collection = %collection,
            deleted = outcome.deleted.len(),
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            ordered = outcome.order.len(),
            errors = outcome.errors.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Reconciled media field"
        );

        outcome
    }

    /// Delete records of the collection, narrowed by the field's filter, whose
    /// uuid is not a key of the desired state.
    ///
    /// Returns the uuids still present in the collection afterwards, or `None`
    /// when the collection could not be listed.
    async fn delete_abandoned(
        &self,
        field: &FieldConfig,
        owner: &MediaOwner,
        collection: &str,
        outcome: &mut ReconcileOutcome,
    ) -> Option<HashSet<Uuid>> {
        let records = match self.store.list_media(owner, collection).await {
            Ok(records) => records,
            Err(e) => {
                outcome.record_error(e.into(), "Failed to list media, skipping deletions");
                return None;
            }
        };

        let mut known: HashSet<Uuid> = records.iter().map(|r| r.uuid).collect();

        let ctx = EvaluationContext::new(Some(owner));
        let abandoned: Vec<MediaRecord> = field
            .get_filtered_media(&ctx, records)
            .into_iter()
            .filter(|r| r.collection_name == collection)
            .filter(|r| !outcome.state.contains_key(&r.uuid.to_string()))
            .collect();

        for record in abandoned {
            match self.store.delete_media(&record).await {
                Ok(()) => {
                    tracing::debug!(uuid = %record.uuid, "Deleted abandoned media");
                    known.remove(&record.uuid);
                    outcome.deleted.push(record.uuid);
                }
                Err(e) => outcome.record_error(e.into(), "Failed to delete abandoned media"),
            }
        }

        Some(known)
    }

    async fn create_pending(
        &self,
        field: &FieldConfig,
        owner: &MediaOwner,
        collection: &str,
        outcome: &mut ReconcileOutcome,
    ) {
        let pending = outcome.state.pending();
        if pending.is_empty() {
            return;
        }

        if !self.store.accepts_media(owner) {
            tracing::debug!(
                owner = %owner,
                count = pending.len(),
                "Owner cannot have media attached, leaving uploads pending"
            );
            outcome.skipped.extend(pending.into_iter().map(|(key, _)| key));
            return;
        }

        for (key, upload) in pending {
            match self.create_one(field, owner, collection, &upload).await {
                Ok(record) => {
                    outcome.state.mark_persisted(&key, record.uuid);
                    outcome.created.push(record.uuid);
                    if let Err(e) = self.staging.discard(&upload).await {
                        tracing::debug!(error = %e, token = %upload.token, "Failed to discard staged upload");
                    }
                }
                Err(err) => {
                    outcome.skipped.push(key);
                    outcome.record_error(err, "Skipped pending upload");
                }
            }
        }
    }

    async fn create_one(
        &self,
        field: &FieldConfig,
        owner: &MediaOwner,
        collection: &str,
        upload: &PendingUpload,
    ) -> Result<MediaRecord, SyncError> {
        let exists = match self.staging.exists(upload).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::debug!(error = %e, token = %upload.token, "Unable to check staged upload");
                false
            }
        };
        if !exists {
            return Err(SyncError::TransientUploadMissing(upload.token.clone()));
        }

        let info = self
            .staging
            .info(upload)
            .await
            .map_err(|e| staged_error(upload, e))?;
        let data = self
            .staging
            .bytes(upload)
            .await
            .map_err(|e| staged_error(upload, e))?;

        let ctx = EvaluationContext::new(Some(owner)).with_upload(&info);
        let params = field.get_transform_parameters(&ctx)?;
        let output = self.pipeline.transform(
            data,
            &info.mime_type,
            &params,
            &sanitize_filename(&info.client_filename),
        )?;

        let options =
            field.new_media_options(&ctx, output.file_name, output.mime_type, &self.default_disk);
        let record = self
            .store
            .create_media(owner, collection, Vec::from(output.data), options)
            .await?;

        tracing::debug!(
            uuid = %record.uuid,
            file_name = %record.file_name,
            size_bytes = record.size_bytes,
            transformed = output.transformed,
            "Created media from upload"
        );

        Ok(record)
    }

    /// Resolve the persisted entries to ids in one lookup and hand the
    /// resulting sequence to the store.
    ///
    /// Only uuids in `known`, the records of the reconciled collection, are
    /// ordered.
    async fn persist_order(&self, known: &HashSet<Uuid>, outcome: &mut ReconcileOutcome) {
        let uuids = outcome.state.persisted_uuids();
        if uuids.is_empty() {
            return;
        }

        let ids = match self.store.resolve_ids(&uuids).await {
            Ok(ids) => ids,
            Err(e) => {
                outcome.record_error(e.into(), "Failed to resolve media ids, order unchanged");
                return;
            }
        };

        for uuid in uuids {
            match ids.get(&uuid) {
                Some(&id) if known.contains(&uuid) => outcome.order.push((uuid, id)),
                _ => {
                    SyncError::UnresolvableIdentifier(uuid.to_string())
                        .log("Dropped media from order");
                    outcome.unresolved.push(uuid);
                }
            }
        }

        if outcome.order.is_empty() {
            return;
        }

        let result = self.store.set_order(&outcome.order).await;
        if let Err(e) = result {
            outcome.record_error(e.into(), "Failed to persist media order");
        }
    }
}

/// A staged upload that vanished between the existence check and the read
/// is treated like one that was already gone.
fn staged_error(upload: &PendingUpload, err: StorageError) -> SyncError {
    match err {
        StorageError::NotFound(_) => SyncError::TransientUploadMissing(upload.token.clone()),
        other => other.into(),
    }
}
