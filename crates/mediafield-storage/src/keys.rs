//! Shared key and path generation for store backends.
//!
//! Relative media path: `{id}/{file_name}`; conversions live under
//! `{id}/conversions/{stem}-{conversion}.{ext}`.

use std::path::{Path, PathBuf};

use mediafield_core::models::MediaRecord;

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

/// Join a validated key onto `base`.
pub fn key_to_path(base: &Path, key: &str) -> StorageResult<PathBuf> {
    validate_key(key)?;
    Ok(base.join(key))
}

/// Relative path of a record's original file or of one of its conversions.
pub fn media_path(record: &MediaRecord, conversion: Option<&str>) -> String {
    match conversion {
        None => format!("{}/{}", record.id, record.file_name),
        Some(conversion) => {
            let path = Path::new(&record.file_name);
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&record.file_name);
            match path.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("{}/conversions/{}-{}.{}", record.id, stem, conversion, ext),
                None => format!("{}/conversions/{}-{}", record.id, stem, conversion),
            }
        }
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
