//! Display-time resolution of an attached file.

use std::sync::Arc;
use std::time::Duration;

use mediafield_core::{
    EvaluationContext, FieldConfig, MediaOwner, MediaRecord, SyncError, UploadedFileInfo,
    Visibility,
};
use mediafield_storage::MediaStore;
use uuid::Uuid;

const DEFAULT_TEMPORARY_URL_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct DisplayResolver {
    store: Arc<dyn MediaStore>,
    temporary_url_ttl: Duration,
}

impl DisplayResolver {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            temporary_url_ttl: DEFAULT_TEMPORARY_URL_TTL,
        }
    }

    pub fn with_temporary_url_ttl(mut self, ttl: Duration) -> Self {
        self.temporary_url_ttl = ttl;
        self
    }

    /// Name, size, type and URL of the record `uuid` of `owner`.
    ///
    /// `None` when there is no owner, no such record, or the lookup fails.
    pub async fn resolve(
        &self,
        field: &FieldConfig,
        owner: Option<&MediaOwner>,
        uuid: Uuid,
    ) -> Option<UploadedFileInfo> {
        let owner = owner?;

        let record = match self.store.find_media(owner, uuid).await {
            Ok(record) => record?,
            Err(e) => {
                SyncError::from(e).log("Failed to look up media for display");
                return None;
            }
        };

        let ctx = EvaluationContext::new(Some(owner));
        let url = self.url(field, &ctx, &record).await?;

        Some(UploadedFileInfo {
            name: record.display_name().to_string(),
            size: record.size_bytes,
            mime_type: record.mime_type.clone(),
            url,
        })
    }

    /// Temporary URL for private fields, then the conversion URL when that
    /// conversion was generated, then the default URL.
    async fn url(
        &self,
        field: &FieldConfig,
        ctx: &EvaluationContext<'_>,
        record: &MediaRecord,
    ) -> Option<String> {
        if field.get_visibility(ctx) == Visibility::Private {
            match self
                .store
                .temporary_url(record, self.temporary_url_ttl)
                .await
            {
                Ok(url) => return Some(url),
                Err(e) => SyncError::from(e).log("Temporary URL unavailable, using permanent URL"),
            }
        }

        let conversion = field
            .get_conversion(ctx)
            .filter(|c| record.has_generated_conversion(c));

        match self.store.url(record, conversion.as_deref()) {
            Ok(url) => Some(url),
            Err(e) => {
                SyncError::from(e).log("Failed to build media URL");
                None
            }
        }
    }
}
