use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use mediafield_core::{OptimizationFormat, ResizePercent, TransformParameters};
use mediafield_processing::{detect_format, TransformPipeline};

fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17)) as u8;
        Rgb([v, v.wrapping_mul(3), v.wrapping_add(x as u8)])
    }));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

#[test]
fn test_configured_jpeg_quality_drives_output_size() {
    let params = TransformParameters::new(Some(OptimizationFormat::Jpg), None);
    let data = noisy_png(64, 64);

    let low = TransformPipeline::new(20)
        .transform(data.clone(), "image/png", &params, "noise.png")
        .unwrap();
    let high = TransformPipeline::new(95)
        .transform(data, "image/png", &params, "noise.png")
        .unwrap();

    assert_eq!(low.file_name, "noise.jpg");
    assert!(low.data.len() < high.data.len());
}

#[test]
fn test_jpeg_source_is_resized_as_jpeg() {
    let params = TransformParameters::new(
        Some(OptimizationFormat::Jpeg),
        ResizePercent::new(50).unwrap(),
    );
    let out = TransformPipeline::default()
        .transform(noisy_png(300, 100), "image/png", &params, "banner.png")
        .unwrap();

    let decoded = image::load_from_memory(&out.data).unwrap();
    assert_eq!(decoded.dimensions(), (150, 50));
    assert_eq!(detect_format(&out.data), Some(OptimizationFormat::Jpeg));
    assert_eq!(out.mime_type, "image/jpeg");
}
