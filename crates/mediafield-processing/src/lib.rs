//! Mediafield Processing Library
//!
//! Image transforms applied to uploads before they are stored: recompression
//! to a configured format and a percentage shrink of the longer side.

pub mod compression;
pub mod error;
pub mod image;
pub mod naming;

pub use compression::{detect_format, ImageCompressor, DEFAULT_JPEG_QUALITY};
pub use error::TransformError;
pub use self::image::resize::{ImageResize, ResizeDimensions};
pub use self::image::transformer::{TransformOutput, TransformPipeline};
pub use naming::{format_file_name, sanitize_filename};
