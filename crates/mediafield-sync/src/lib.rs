//! Mediafield Sync Library
//!
//! Keeps a form field's list of attached files in step with the media store:
//!
//! - [`StateLoader`] reads the initial desired state when a form is filled
//! - [`ReconciliationEngine`] deletes, creates and reorders records on save
//! - [`DisplayResolver`] resolves the name and URL shown for a stored file
//!
//! [`MediaField`] bundles all three with a [`FieldConfig`](mediafield_core::FieldConfig).

pub mod display;
pub mod field;
pub mod loader;
pub mod reconcile;
pub mod telemetry;

pub use display::DisplayResolver;
pub use field::MediaField;
pub use loader::StateLoader;
pub use reconcile::{ReconcileOutcome, ReconciliationEngine};
pub use telemetry::init_tracing;
