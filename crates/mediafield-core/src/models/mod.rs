//! Data models
//!
//! Persisted media records and their owners, the desired attachment state
//! submitted by a form, staged uploads and transform parameters.

mod media;
mod state;
mod transform;
mod upload;

pub use media::{MediaOwner, MediaRecord, NewMediaOptions, UploadedFileInfo};
pub use state::{AttachmentEntry, DesiredState};
pub use transform::{OptimizationFormat, ResizePercent, TransformParameters};
pub use upload::{PendingUpload, StagedUploadInfo};
