use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use mediafield_core::OptimizationFormat;

use crate::error::TransformError;

/// Quality used for JPEG when no explicit quality is requested.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encoder default for WebP (0-100)
const DEFAULT_WEBP_QUALITY: f32 = 75.0;

/// Encoder default for AVIF (0-100)
const DEFAULT_AVIF_QUALITY: f32 = 80.0;

/// Map the container format of decoded bytes onto a format we can encode.
pub fn from_image_format(format: ImageFormat) -> Option<OptimizationFormat> {
    match format {
        ImageFormat::Jpeg => Some(OptimizationFormat::Jpeg),
        ImageFormat::Png => Some(OptimizationFormat::Png),
        ImageFormat::WebP => Some(OptimizationFormat::Webp),
        ImageFormat::Gif => Some(OptimizationFormat::Gif),
        ImageFormat::Avif => Some(OptimizationFormat::Avif),
        _ => None,
    }
}

/// Detect the encodable format of raw image bytes from their magic number.
pub fn detect_format(data: &[u8]) -> Option<OptimizationFormat> {
    image::guess_format(data).ok().and_then(from_image_format)
}

/// Format implied by a mime type, falling back to JPEG.
pub fn format_from_mime(mime_type: &str) -> OptimizationFormat {
    match mime_type {
        "image/png" => OptimizationFormat::Png,
        "image/gif" => OptimizationFormat::Gif,
        "image/webp" => OptimizationFormat::Webp,
        "image/avif" => OptimizationFormat::Avif,
        _ => OptimizationFormat::Jpeg,
    }
}

/// Quality for an optimization pass: the configured JPEG quality for
/// `jpeg`/`jpg`, the encoder default otherwise.
pub fn quality_for(format: OptimizationFormat, jpeg_quality: u8) -> Option<u8> {
    if format.is_jpeg() {
        Some(jpeg_quality)
    } else {
        None
    }
}

/// Encoders for every supported output format
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode `img` as `format`. `None` quality uses the encoder default.
    pub fn encode(
        img: &DynamicImage,
        format: OptimizationFormat,
        quality: Option<u8>,
    ) -> Result<Bytes, TransformError> {
        let encoded = match format {
            OptimizationFormat::Jpeg | OptimizationFormat::Jpg => {
                Self::compress_jpeg(img, quality.unwrap_or(DEFAULT_JPEG_QUALITY))
                    .map_err(|e| TransformError::encode(format, e))?
            }
            OptimizationFormat::Png => Self::write_with_image(img, ImageFormat::Png, format)?,
            OptimizationFormat::Gif => {
                let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
                Self::write_with_image(&rgba, ImageFormat::Gif, format)?
            }
            OptimizationFormat::Webp => Self::compress_webp(
                img,
                quality.map(f32::from).unwrap_or(DEFAULT_WEBP_QUALITY),
            )?,
            OptimizationFormat::Avif => Self::compress_avif(
                img,
                quality.map(f32::from).unwrap_or(DEFAULT_AVIF_QUALITY),
            )?,
        };

        tracing::debug!(
            format = %format,
            quality = ?quality,
            size_bytes = encoded.len(),
            "Encoded image"
        );

        Ok(encoded)
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: u8) -> std::io::Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&rgb_img)?;
        let jpeg_data = comp.finish()?;

        Ok(Bytes::from(jpeg_data))
    }

    fn write_with_image(
        img: &DynamicImage,
        image_format: ImageFormat,
        format: OptimizationFormat,
    ) -> Result<Bytes, TransformError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, image_format)
            .map_err(|e| TransformError::encode(format, e))?;
        Ok(Bytes::from(buffer))
    }

    /// Compress to WebP
    ///
    /// libwebp rejects sides above 16383 px; that surfaces as an encode error.
    fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Bytes, TransformError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode_simple(false, quality).map_err(|e| {
            TransformError::encode(OptimizationFormat::Webp, format!("{:?}", e))
        })?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compress to AVIF
    fn compress_avif(img: &DynamicImage, quality: f32) -> Result<Bytes, TransformError> {
        let (width, height) = img.dimensions();

        let rgb_img = img.to_rgb8();
        let rgb_data: Vec<rgb::RGB8> = rgb_img
            .as_raw()
            .chunks_exact(3)
            .map(|chunk| rgb::RGB8::new(chunk[0], chunk[1], chunk[2]))
            .collect();

        let img_buf = ravif::Img::new(rgb_data.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality)
            .with_speed(6);

        let avif_data = encoder
            .encode_rgb(img_buf)
            .map_err(|e| TransformError::encode(OptimizationFormat::Avif, e))?;

        Ok(Bytes::from(avif_data.avif_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(32, 16, |x, y| {
            Rgb([(x * 8) as u8, (y * 16) as u8, 128])
        }))
    }

    #[test]
    fn test_quality_only_applies_to_jpeg() {
        assert_eq!(quality_for(OptimizationFormat::Jpeg, 70), Some(70));
        assert_eq!(quality_for(OptimizationFormat::Jpg, 70), Some(70));
        assert_eq!(quality_for(OptimizationFormat::Webp, 70), None);
        assert_eq!(quality_for(OptimizationFormat::Png, 70), None);
    }

    #[test]
    fn test_encoded_bytes_carry_requested_format() {
        let img = sample();
        for format in [
            OptimizationFormat::Jpeg,
            OptimizationFormat::Png,
            OptimizationFormat::Gif,
            OptimizationFormat::Webp,
        ] {
            let encoded = ImageCompressor::encode(&img, format, None).unwrap();
            let detected = detect_format(&encoded).unwrap();
            assert_eq!(detected.mime_type(), format.mime_type());
        }
    }

    #[test]
    fn test_lower_jpeg_quality_is_smaller() {
        let img = sample();
        let low = ImageCompressor::encode(&img, OptimizationFormat::Jpeg, Some(10)).unwrap();
        let high = ImageCompressor::encode(&img, OptimizationFormat::Jpeg, Some(95)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_webp_side_limit() {
        let wide = DynamicImage::ImageRgb8(RgbImage::new(17000, 4));
        let result = ImageCompressor::encode(&wide, OptimizationFormat::Webp, None);
        assert!(matches!(result, Err(TransformError::Encode { .. })));
    }

    #[test]
    fn test_format_from_mime() {
        assert_eq!(format_from_mime("image/png"), OptimizationFormat::Png);
        assert_eq!(format_from_mime("image/x-unknown"), OptimizationFormat::Jpeg);
    }
}
