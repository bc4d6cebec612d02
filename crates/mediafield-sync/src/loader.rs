//! Desired state at hydration time.

use std::sync::Arc;

use mediafield_core::{DesiredState, EvaluationContext, FieldConfig, MediaOwner, SyncError};
use mediafield_storage::MediaStore;

/// Projects the persisted records of a field into its initial desired state.
#[derive(Clone)]
pub struct StateLoader {
    store: Arc<dyn MediaStore>,
}

impl StateLoader {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Load the initial state of `field` for `owner`.
    ///
    /// Single-valued fields keep only the first record, and the media filter
    /// runs after that truncation, so a filtered-out first record yields an
    /// empty state. A missing owner or a failing store yields an empty state.
    #[tracing::instrument(skip(self, field, owner), fields(owner = ?owner))]
    pub async fn load(&self, field: &FieldConfig, owner: Option<&MediaOwner>) -> DesiredState {
        let Some(owner) = owner else {
            return DesiredState::new();
        };

        let ctx = EvaluationContext::new(Some(owner));
        let collection = field.get_collection(&ctx);

        let mut records = match self.store.list_media(owner, &collection).await {
            Ok(records) => records,
            Err(e) => {
                SyncError::from(e).log("Failed to load media, starting from an empty state");
                return DesiredState::new();
            }
        };

        if !field.is_multiple(&ctx) {
            records.truncate(1);
        }

        let records = field.get_filtered_media(&ctx, records);

        tracing::debug!(
            collection = %collection,
            count = records.len(),
            "Loaded field state"
        );

        DesiredState::from_persisted(records.into_iter().map(|r| r.uuid))
    }
}
