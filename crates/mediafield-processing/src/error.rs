use mediafield_core::{OptimizationFormat, SyncError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {format} image: {message}")]
    Encode {
        format: OptimizationFormat,
        message: String,
    },
}

impl TransformError {
    pub(crate) fn encode(format: OptimizationFormat, err: impl std::fmt::Display) -> Self {
        TransformError::Encode {
            format,
            message: err.to_string(),
        }
    }
}

impl From<TransformError> for SyncError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Decode(msg) => SyncError::DecodeFailure(msg),
            other @ TransformError::Encode { .. } => SyncError::Encode(other.to_string()),
        }
    }
}
