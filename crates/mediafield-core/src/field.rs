//! Field configuration
//!
//! A [`FieldConfig`] describes one attachment field: which collection it
//! manages, how new uploads are stored and transformed, and which persisted
//! records take part in reconciliation. Every option holds either a literal or
//! a deferred computation; deferred values are evaluated at the point of use,
//! every time, and never cached.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::SyncError;
use crate::models::{
    MediaOwner, MediaRecord, NewMediaOptions, OptimizationFormat, ResizePercent, StagedUploadInfo,
    TransformParameters,
};
use crate::storage_types::Visibility;

pub const DEFAULT_COLLECTION: &str = "default";

/// What a deferred option can look at when it is evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    pub owner: Option<&'a MediaOwner>,
    pub upload: Option<&'a StagedUploadInfo>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(owner: Option<&'a MediaOwner>) -> Self {
        Self {
            owner,
            upload: None,
        }
    }

    pub fn with_upload(self, upload: &'a StagedUploadInfo) -> Self {
        Self {
            upload: Some(upload),
            ..self
        }
    }
}

type Deferred<T> = Arc<dyn Fn(&EvaluationContext<'_>) -> T + Send + Sync>;

/// A literal option value or a function of the evaluation context.
#[derive(Clone)]
pub enum Configurable<T> {
    Value(T),
    Deferred(Deferred<T>),
}

impl<T: Clone> Configurable<T> {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> T + Send + Sync + 'static,
    {
        Configurable::Deferred(Arc::new(f))
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> T {
        match self {
            Configurable::Value(value) => value.clone(),
            Configurable::Deferred(f) => f(ctx),
        }
    }
}

impl<T: Default> Default for Configurable<T> {
    fn default() -> Self {
        Configurable::Value(T::default())
    }
}

impl<T> From<T> for Configurable<T> {
    fn from(value: T) -> Self {
        Configurable::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Configurable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configurable::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Configurable::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Narrows the persisted records that take part in loading and abandonment detection.
pub type MediaFilter =
    Arc<dyn Fn(&EvaluationContext<'_>, Vec<MediaRecord>) -> Vec<MediaRecord> + Send + Sync>;

pub type Manipulations = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Clone, Default)]
pub struct FieldConfig {
    collection: Configurable<Option<String>>,
    conversion: Configurable<Option<String>>,
    conversions_disk: Configurable<Option<String>>,
    disk: Configurable<Option<String>>,
    visibility: Configurable<Visibility>,
    multiple: Configurable<bool>,
    responsive_images: Configurable<bool>,
    media_name: Configurable<Option<String>>,
    custom_headers: Configurable<JsonMap<String, JsonValue>>,
    custom_properties: Configurable<JsonMap<String, JsonValue>>,
    manipulations: Configurable<Manipulations>,
    properties: Configurable<JsonMap<String, JsonValue>>,
    filter_media: Option<MediaFilter>,
    optimization: Configurable<Option<OptimizationFormat>>,
    resize: Configurable<Option<u8>>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Configurable::Value(Some(collection.into()));
        self
    }

    pub fn collection_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.collection = Configurable::deferred(f);
        self
    }

    pub fn conversion(mut self, conversion: impl Into<String>) -> Self {
        self.conversion = Configurable::Value(Some(conversion.into()));
        self
    }

    pub fn conversions_disk(mut self, disk: impl Into<String>) -> Self {
        self.conversions_disk = Configurable::Value(Some(disk.into()));
        self
    }

    pub fn disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = Configurable::Value(Some(disk.into()));
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Configurable::Value(visibility);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = Configurable::Value(multiple);
        self
    }

    pub fn multiple_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.multiple = Configurable::deferred(f);
        self
    }

    pub fn responsive_images(mut self, condition: bool) -> Self {
        self.responsive_images = Configurable::Value(condition);
        self
    }

    pub fn media_name(mut self, name: impl Into<String>) -> Self {
        self.media_name = Configurable::Value(Some(name.into()));
        self
    }

    /// Derive the display name from the upload being stored.
    pub fn media_name_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.media_name = Configurable::deferred(f);
        self
    }

    pub fn custom_headers(mut self, headers: JsonMap<String, JsonValue>) -> Self {
        self.custom_headers = Configurable::Value(headers);
        self
    }

    pub fn custom_properties(mut self, properties: JsonMap<String, JsonValue>) -> Self {
        self.custom_properties = Configurable::Value(properties);
        self
    }

    pub fn custom_properties_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> JsonMap<String, JsonValue> + Send + Sync + 'static,
    {
        self.custom_properties = Configurable::deferred(f);
        self
    }

    pub fn manipulations(mut self, manipulations: Manipulations) -> Self {
        self.manipulations = Configurable::Value(manipulations);
        self
    }

    pub fn properties(mut self, properties: JsonMap<String, JsonValue>) -> Self {
        self.properties = Configurable::Value(properties);
        self
    }

    pub fn filter_media<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>, Vec<MediaRecord>) -> Vec<MediaRecord> + Send + Sync + 'static,
    {
        self.filter_media = Some(Arc::new(f));
        self
    }

    pub fn optimize(mut self, format: OptimizationFormat) -> Self {
        self.optimization = Configurable::Value(Some(format));
        self
    }

    pub fn optimize_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Option<OptimizationFormat> + Send + Sync + 'static,
    {
        self.optimization = Configurable::deferred(f);
        self
    }

    pub fn resize(mut self, percent: u8) -> Self {
        self.resize = Configurable::Value(Some(percent));
        self
    }

    pub fn resize_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> Option<u8> + Send + Sync + 'static,
    {
        self.resize = Configurable::deferred(f);
        self
    }

    pub fn get_collection(&self, ctx: &EvaluationContext<'_>) -> String {
        self.collection
            .evaluate(ctx)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string())
    }

    pub fn get_conversion(&self, ctx: &EvaluationContext<'_>) -> Option<String> {
        self.conversion.evaluate(ctx)
    }

    pub fn get_conversions_disk(&self, ctx: &EvaluationContext<'_>) -> Option<String> {
        self.conversions_disk.evaluate(ctx)
    }

    pub fn get_disk(&self, ctx: &EvaluationContext<'_>) -> Option<String> {
        self.disk.evaluate(ctx)
    }

    pub fn get_visibility(&self, ctx: &EvaluationContext<'_>) -> Visibility {
        self.visibility.evaluate(ctx)
    }

    pub fn is_multiple(&self, ctx: &EvaluationContext<'_>) -> bool {
        self.multiple.evaluate(ctx)
    }

    pub fn has_responsive_images(&self, ctx: &EvaluationContext<'_>) -> bool {
        self.responsive_images.evaluate(ctx)
    }

    pub fn get_media_name(&self, ctx: &EvaluationContext<'_>) -> Option<String> {
        self.media_name.evaluate(ctx)
    }

    pub fn get_custom_headers(&self, ctx: &EvaluationContext<'_>) -> JsonMap<String, JsonValue> {
        self.custom_headers.evaluate(ctx)
    }

    pub fn get_custom_properties(
        &self,
        ctx: &EvaluationContext<'_>,
    ) -> JsonMap<String, JsonValue> {
        self.custom_properties.evaluate(ctx)
    }

    pub fn get_manipulations(&self, ctx: &EvaluationContext<'_>) -> Manipulations {
        self.manipulations.evaluate(ctx)
    }

    pub fn get_properties(&self, ctx: &EvaluationContext<'_>) -> JsonMap<String, JsonValue> {
        self.properties.evaluate(ctx)
    }

    pub fn has_media_filter(&self) -> bool {
        self.filter_media.is_some()
    }

    /// Apply the media filter, if any. Evaluated on every call.
    pub fn get_filtered_media(
        &self,
        ctx: &EvaluationContext<'_>,
        media: Vec<MediaRecord>,
    ) -> Vec<MediaRecord> {
        match &self.filter_media {
            Some(filter) => filter(ctx, media),
            None => media,
        }
    }

    pub fn get_transform_parameters(
        &self,
        ctx: &EvaluationContext<'_>,
    ) -> Result<TransformParameters, SyncError> {
        let resize = match self.resize.evaluate(ctx) {
            Some(percent) => ResizePercent::new(percent)?,
            None => None,
        };
        Ok(TransformParameters::new(self.optimization.evaluate(ctx), resize))
    }

    /// Assemble the pass-through options for a new record.
    ///
    /// `ctx` must carry the upload being stored so that the display name can
    /// fall back to the client filename.
    pub fn new_media_options(
        &self,
        ctx: &EvaluationContext<'_>,
        file_name: String,
        mime_type: String,
        default_disk: &str,
    ) -> NewMediaOptions {
        let display_name = self
            .get_media_name(ctx)
            .or_else(|| ctx.upload.map(|u| u.client_stem().to_string()))
            .unwrap_or_else(|| file_name.clone());

        NewMediaOptions {
            custom_headers: self.get_custom_headers(ctx),
            file_name,
            display_name,
            mime_type,
            conversions_disk: self.get_conversions_disk(ctx).unwrap_or_default(),
            custom_properties: self.get_custom_properties(ctx),
            manipulations: self.get_manipulations(ctx),
            responsive_images: self.has_responsive_images(ctx),
            properties: self.get_properties(ctx),
            target_disk: self
                .get_disk(ctx)
                .unwrap_or_else(|| default_disk.to_string()),
        }
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("collection", &self.collection)
            .field("conversion", &self.conversion)
            .field("disk", &self.disk)
            .field("visibility", &self.visibility)
            .field("multiple", &self.multiple)
            .field("has_media_filter", &self.has_media_filter())
            .field("optimization", &self.optimization)
            .field("resize", &self.resize)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn upload(name: &str) -> StagedUploadInfo {
        StagedUploadInfo {
            token: "tok".to_string(),
            client_filename: name.to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 4,
        }
    }

    #[test]
    fn test_collection_defaults() {
        let ctx = EvaluationContext::default();
        assert_eq!(FieldConfig::new().get_collection(&ctx), "default");
        assert_eq!(
            FieldConfig::new().collection("avatars").get_collection(&ctx),
            "avatars"
        );
    }

    #[test]
    fn test_deferred_values_see_owner() {
        let owner = MediaOwner::new("user", "42");
        let field = FieldConfig::new().collection_using(|ctx| {
            ctx.owner.map(|o| format!("{}-gallery", o.model_type))
        });

        assert_eq!(
            field.get_collection(&EvaluationContext::new(Some(&owner))),
            "user-gallery"
        );
        assert_eq!(field.get_collection(&EvaluationContext::new(None)), "default");
    }

    #[test]
    fn test_filter_is_evaluated_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let field = FieldConfig::new().filter_media(move |_, media| {
            counter.fetch_add(1, Ordering::SeqCst);
            media
        });

        let ctx = EvaluationContext::default();
        field.get_filtered_media(&ctx, Vec::new());
        field.get_filtered_media(&ctx, Vec::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transform_parameters() {
        let ctx = EvaluationContext::default();
        let params = FieldConfig::new()
            .optimize(OptimizationFormat::Webp)
            .resize(20)
            .get_transform_parameters(&ctx)
            .unwrap();
        assert_eq!(params.optimization, Some(OptimizationFormat::Webp));
        assert_eq!(params.resize.map(|p| p.get()), Some(20));

        assert!(FieldConfig::new()
            .get_transform_parameters(&ctx)
            .unwrap()
            .is_noop());

        assert!(FieldConfig::new()
            .resize(150)
            .get_transform_parameters(&ctx)
            .is_err());
    }

    #[test]
    fn test_new_media_options_display_name() {
        let info = upload("holiday.png");
        let ctx = EvaluationContext::default().with_upload(&info);

        let options = FieldConfig::new().new_media_options(
            &ctx,
            "holiday.png".to_string(),
            "image/png".to_string(),
            "public",
        );
        assert_eq!(options.display_name, "holiday");
        assert_eq!(options.target_disk, "public");
        assert_eq!(options.conversions_disk, "");

        let options = FieldConfig::new()
            .media_name_using(|ctx| ctx.upload.map(|u| u.client_filename.to_uppercase()))
            .disk("s3")
            .conversions_disk("thumbs")
            .new_media_options(
                &ctx,
                "holiday.png".to_string(),
                "image/png".to_string(),
                "public",
            );
        assert_eq!(options.display_name, "HOLIDAY.PNG");
        assert_eq!(options.target_disk, "s3");
        assert_eq!(options.conversions_disk, "thumbs");
    }
}
