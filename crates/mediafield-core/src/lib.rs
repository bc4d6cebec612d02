//! Mediafield Core Library
//!
//! This crate provides the domain models, field configuration, error types and
//! environment configuration shared by all mediafield components.

pub mod config;
pub mod error;
pub mod field;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, SyncError};
pub use field::{Configurable, EvaluationContext, FieldConfig, MediaFilter};
pub use models::{
    AttachmentEntry, DesiredState, MediaOwner, MediaRecord, NewMediaOptions, OptimizationFormat,
    PendingUpload, ResizePercent, StagedUploadInfo, TransformParameters, UploadedFileInfo,
};
pub use storage_types::{StoreBackend, Visibility};
