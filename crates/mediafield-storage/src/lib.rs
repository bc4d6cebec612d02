//! Mediafield Storage Library
//!
//! This crate defines the two collaborators the synchronization engine talks
//! to: the [`MediaStore`] that owns persisted media records and their bytes,
//! and the [`UploadStaging`] area that holds uploads until a form is saved.
//!
//! Two implementations of each are provided: an in-memory one and one backed
//! by the local filesystem.
//!
//! # Local layout
//!
//! - records manifest: `{root}/media.json`
//! - original files: `{root}/{disk}/{id}/{file_name}`
//! - staged uploads: `{staging}/{token}` with a `{token}.json` sidecar
//!
//! Keys must not contain `..` or a leading `/`. Path handling is centralized
//! in the `keys` module.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub(crate) mod record;
pub mod staging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_stores, Stores};
#[cfg(feature = "storage-local")]
pub use local::LocalMediaStore;
pub use mediafield_core::StoreBackend;
pub use memory::MemoryMediaStore;
#[cfg(feature = "storage-local")]
pub use staging::LocalUploadStaging;
pub use staging::MemoryUploadStaging;
pub use traits::{MediaStore, StorageError, StorageResult, UploadStaging};
