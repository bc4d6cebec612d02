//! A configured field bound to its collaborators.

use std::sync::Arc;

use mediafield_core::{
    Config, DesiredState, FieldConfig, MediaOwner, PendingUpload, SyncError, UploadedFileInfo,
};
use mediafield_processing::TransformPipeline;
use mediafield_storage::{MediaStore, Stores, UploadStaging};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::display::DisplayResolver;
use crate::loader::StateLoader;
use crate::reconcile::{ReconcileOutcome, ReconciliationEngine};

/// Everything the form layer needs for one media field: hydrate, save and
/// display.
#[derive(Clone)]
pub struct MediaField {
    config: FieldConfig,
    staging: Arc<dyn UploadStaging>,
    loader: StateLoader,
    engine: ReconciliationEngine,
    display: DisplayResolver,
}

impl MediaField {
    /// Bind `config` to the stores with default settings.
    pub fn new(
        config: FieldConfig,
        store: Arc<dyn MediaStore>,
        staging: Arc<dyn UploadStaging>,
    ) -> Self {
        Self {
            config,
            loader: StateLoader::new(store.clone()),
            engine: ReconciliationEngine::new(store.clone(), staging.clone()),
            display: DisplayResolver::new(store),
            staging,
        }
    }

    /// Bind `config` to the stores, taking disk, JPEG quality and temporary
    /// URL lifetime from `settings`.
    pub fn from_config(config: FieldConfig, stores: &Stores, settings: &Config) -> Self {
        let engine = ReconciliationEngine::new(stores.media.clone(), stores.staging.clone())
            .with_pipeline(TransformPipeline::new(settings.jpeg_quality))
            .with_default_disk(settings.default_disk.clone());
        let display = DisplayResolver::new(stores.media.clone())
            .with_temporary_url_ttl(settings.temporary_url_ttl());

        Self {
            config,
            staging: stores.staging.clone(),
            loader: StateLoader::new(stores.media.clone()),
            engine,
            display,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Initial state for `owner`, read from the store.
    pub async fn load_state(&self, owner: Option<&MediaOwner>) -> DesiredState {
        self.loader.load(&self.config, owner).await
    }

    /// Normalize a hydrated form value; scalars and null become empty.
    pub fn hydrate(&self, value: &JsonValue) -> DesiredState {
        DesiredState::from_hydrated(value)
    }

    /// Stage an upload so it can be added to a desired state.
    pub async fn stage_upload(
        &self,
        data: Vec<u8>,
        client_filename: &str,
        mime_type: &str,
    ) -> Result<PendingUpload, SyncError> {
        Ok(self.staging.stage(data, client_filename, mime_type).await?)
    }

    /// Reconcile `state` for `owner`.
    pub async fn save(&self, owner: &MediaOwner, state: DesiredState) -> ReconcileOutcome {
        self.engine.reconcile(&self.config, owner, state).await
    }

    pub async fn uploaded_file(
        &self,
        owner: Option<&MediaOwner>,
        uuid: Uuid,
    ) -> Option<UploadedFileInfo> {
        self.display.resolve(&self.config, owner, uuid).await
    }
}
