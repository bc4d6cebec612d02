//! Error types module
//!
//! All failures surfaced by the synchronization engine are unified under
//! [`SyncError`]. Most variants are handled where they occur: the engine logs
//! them at the level reported by [`ErrorMetadata::log_level`] and keeps going.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like an unsupported driver feature
    Debug,
    /// Warning level - for per-item failures that do not stop the batch
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DECODE_FAILURE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation later may succeed
    fn is_recoverable(&self) -> bool;

    /// Whether the reconciliation handles this error locally instead of
    /// returning it to the caller
    fn is_item_local(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Staged upload is no longer available: {0}")]
    TransientUploadMissing(String),

    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Temporary URLs are not supported: {0}")]
    UnsupportedTemporaryUrl(String),

    #[error("Media uuid could not be resolved: {0}")]
    UnresolvableIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        SyncError::Storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Internal(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError::Internal(format!("{:#}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, item_local, log_level).
fn sync_error_static_metadata(err: &SyncError) -> (&'static str, bool, bool, LogLevel) {
    match err {
        SyncError::TransientUploadMissing(_) => {
            ("TRANSIENT_UPLOAD_MISSING", false, true, LogLevel::Warn)
        }
        SyncError::DecodeFailure(_) => ("DECODE_FAILURE", false, true, LogLevel::Warn),
        SyncError::Encode(_) => ("ENCODE_FAILURE", false, true, LogLevel::Error),
        SyncError::UnsupportedTemporaryUrl(_) => {
            ("UNSUPPORTED_TEMPORARY_URL", false, true, LogLevel::Debug)
        }
        SyncError::UnresolvableIdentifier(_) => {
            ("UNRESOLVABLE_IDENTIFIER", false, true, LogLevel::Debug)
        }
        SyncError::Storage(_) => ("STORAGE_ERROR", true, false, LogLevel::Error),
        SyncError::InvalidConfig(_) => ("INVALID_CONFIG", false, false, LogLevel::Error),
        SyncError::NotFound(_) => ("NOT_FOUND", false, false, LogLevel::Debug),
        SyncError::Internal(_) => ("INTERNAL_ERROR", true, false, LogLevel::Error),
    }
}

impl ErrorMetadata for SyncError {
    fn error_code(&self) -> &'static str {
        sync_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        sync_error_static_metadata(self).1
    }

    fn is_item_local(&self) -> bool {
        sync_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        sync_error_static_metadata(self).3
    }
}

impl SyncError {
    /// Emit this error through `tracing` at its configured level.
    pub fn log(&self, context: &str) {
        let code = self.error_code();
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(error = %self, error_code = code, "{}", context),
            LogLevel::Warn => tracing::warn!(error = %self, error_code = code, "{}", context),
            LogLevel::Error => tracing::error!(error = %self, error_code = code, "{}", context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_local_taxonomy() {
        assert!(SyncError::TransientUploadMissing("a".into()).is_item_local());
        assert!(SyncError::DecodeFailure("a".into()).is_item_local());
        assert!(SyncError::UnsupportedTemporaryUrl("a".into()).is_item_local());
        assert!(SyncError::UnresolvableIdentifier("a".into()).is_item_local());
        assert!(!SyncError::Storage("a".into()).is_item_local());
    }

    #[test]
    fn test_error_codes_and_levels() {
        let err = SyncError::DecodeFailure("bad header".into());
        assert_eq!(err.error_code(), "DECODE_FAILURE");
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(!err.is_recoverable());

        let err = SyncError::UnsupportedTemporaryUrl("local".into());
        assert_eq!(err.log_level(), LogLevel::Debug);

        let err = SyncError::Storage("disk full".into());
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: SyncError = io_err.into();
        assert!(matches!(err, SyncError::Storage(_)));
        assert!(err.to_string().contains("gone"));
    }
}
