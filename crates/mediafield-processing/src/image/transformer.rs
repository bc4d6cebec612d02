//! Transform pipeline for uploaded images
//!
//! Chains the two optional transforms a field can request:
//! 1. Optimization: recompress to the configured format
//! 2. Resize: shrink the longer side by a percentage of the optimized pixels
//!    (the source pixels when the optimized format cannot be read back),
//!    re-encoding in the output format at the encoder default
//!
//! Non-image uploads and fields without transforms pass through untouched.

use std::io::Cursor;
use std::time::Instant;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use mediafield_core::{OptimizationFormat, TransformParameters};

use crate::compression::{format_from_mime, from_image_format, quality_for, ImageCompressor};
use crate::error::TransformError;
use crate::image::resize::ImageResize;
use crate::naming::format_file_name;

/// JPEG quality used by optimization unless configured otherwise.
pub const OPTIMIZED_JPEG_QUALITY: u8 = 70;

/// Result of [`TransformPipeline::transform`].
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Bytes,
    pub file_name: String,
    pub mime_type: String,
    /// False when the input was returned unchanged.
    pub transformed: bool,
}

impl TransformOutput {
    fn unchanged(data: Vec<u8>, file_name: &str, mime_type: &str) -> Self {
        Self {
            data: Bytes::from(data),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            transformed: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransformPipeline {
    jpeg_quality: u8,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new(OPTIMIZED_JPEG_QUALITY)
    }
}

impl TransformPipeline {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Apply `params` to an upload.
    ///
    /// A decode failure is returned as an error once decoding was attempted;
    /// the raw bytes are never passed through in that case.
    pub fn transform(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        params: &TransformParameters,
        file_name: &str,
    ) -> Result<TransformOutput, TransformError> {
        if !mime_type.contains("image") || params.is_noop() {
            return Ok(TransformOutput::unchanged(data, file_name, mime_type));
        }

        let start = Instant::now();
        let (img, source_format) = decode(&data, mime_type)?;
        let (orig_width, orig_height) = img.dimensions();

        let mut pixels = img;
        let mut format = source_format;
        let mut encoded: Option<Bytes> = None;

        if let Some(optimization) = params.optimization {
            format = optimization;
            // An AVIF that is about to be resized is only encoded once, below
            if params.resize.is_none() || can_decode(format) {
                let quality = quality_for(format, self.jpeg_quality);
                let bytes = ImageCompressor::encode(&pixels, format, quality)?;
                if params.resize.is_some() {
                    pixels = decode(&bytes, format.mime_type())?.0;
                }
                encoded = Some(bytes);
            }
        }

        if let Some(percent) = params.resize {
            let resized = ImageResize::apply_percent(&pixels, percent);
            encoded = Some(ImageCompressor::encode(&resized, format, None)?);
        }

        let Some(bytes) = encoded else {
            return Ok(TransformOutput::unchanged(data, file_name, mime_type));
        };

        tracing::info!(
            format = %format,
            width = orig_width,
            height = orig_height,
            input_bytes = data.len(),
            output_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image transformed"
        );

        Ok(TransformOutput {
            data: bytes,
            file_name: format_file_name(file_name, format),
            mime_type: format.mime_type().to_string(),
            transformed: true,
        })
    }
}

/// Formats the `image` crate can read back. AVIF is encode-only here.
fn can_decode(format: OptimizationFormat) -> bool {
    format != OptimizationFormat::Avif
}

/// Decode bytes, reporting the format they were encoded in.
fn decode(data: &[u8], mime_type: &str) -> Result<(DynamicImage, OptimizationFormat), TransformError> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .and_then(from_image_format)
        .unwrap_or_else(|| format_from_mime(mime_type));
    let img = reader
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    Ok((img, format))
}
