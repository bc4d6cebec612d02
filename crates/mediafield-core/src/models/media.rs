use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

/// The entity media records are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaOwner {
    pub model_type: String,
    pub model_id: String,
}

impl MediaOwner {
    pub fn new(model_type: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for MediaOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model_type, self.model_id)
    }
}

/// A persisted media record.
///
/// Records are only ever constructed by a media store. `uuid` is the stable
/// external identifier used by form state; `id` is store-internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub owner: MediaOwner,
    pub collection_name: String,
    /// Display name; falls back to `file_name` when absent
    pub name: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub disk: String,
    pub conversions_disk: Option<String>,
    pub order_column: i64,
    #[serde(default)]
    pub custom_headers: JsonMap<String, JsonValue>,
    #[serde(default)]
    pub custom_properties: JsonMap<String, JsonValue>,
    #[serde(default)]
    pub manipulations: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub properties: JsonMap<String, JsonValue>,
    #[serde(default)]
    pub generated_conversions: BTreeMap<String, bool>,
    #[serde(default)]
    pub responsive_images: bool,
    pub created_at: DateTime<Utc>,
}

impl MediaRecord {
    pub fn has_generated_conversion(&self, conversion: &str) -> bool {
        self.generated_conversions
            .get(conversion)
            .copied()
            .unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.file_name)
    }
}

/// Options passed through to the store when a new record is created.
///
/// None of these are computed by the engine; they come straight from the
/// field configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMediaOptions {
    pub custom_headers: JsonMap<String, JsonValue>,
    pub file_name: String,
    pub display_name: String,
    pub mime_type: String,
    /// Empty string means "same disk as the original"
    pub conversions_disk: String,
    pub custom_properties: JsonMap<String, JsonValue>,
    pub manipulations: BTreeMap<String, BTreeMap<String, String>>,
    pub responsive_images: bool,
    pub properties: JsonMap<String, JsonValue>,
    pub target_disk: String,
}

/// What the form layer needs to render an already-persisted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}
