use image::{DynamicImage, GenericImageView};
use mediafield_core::ResizePercent;

/// Resize target box. A `None` side is unconstrained and follows the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Target box that shrinks the longer side by `percent`.
    ///
    /// Only the longer side is constrained; square images constrain the width.
    pub fn target_box(width: u32, height: u32, percent: ResizePercent) -> ResizeDimensions {
        let shrink = |side: u32| {
            let reduction = u64::from(side) * u64::from(percent.get()) / 100;
            (side - reduction as u32).max(1)
        };

        if height > width {
            ResizeDimensions {
                width: None,
                height: Some(shrink(height)),
            }
        } else {
            ResizeDimensions {
                width: Some(shrink(width)),
                height: None,
            }
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> image::imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            image::imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            image::imageops::FilterType::CatmullRom
        } else {
            image::imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Shrink to fit inside `dims`, preserving aspect ratio. Never upscales.
    pub fn scale_down(img: &DynamicImage, dims: ResizeDimensions) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();

        let scale = [
            dims.width.map(|w| w as f64 / orig_width as f64),
            dims.height.map(|h| h as f64 / orig_height as f64),
        ]
        .into_iter()
        .flatten()
        .fold(1.0_f64, f64::min);

        if scale >= 1.0 {
            return img.clone();
        }

        let new_width = ((orig_width as f64 * scale).round() as u32).max(1);
        let new_height = ((orig_height as f64 * scale).round() as u32).max(1);
        Self::resize_image(img, new_width, new_height)
    }

    /// Fill the box then crop the overflow around the center.
    ///
    /// An unconstrained side takes the image's current size.
    pub fn cover(img: &DynamicImage, dims: ResizeDimensions) -> DynamicImage {
        let (width, height) = img.dimensions();
        let box_width = dims.width.unwrap_or(width);
        let box_height = dims.height.unwrap_or(height);

        if (width, height) == (box_width, box_height) {
            return img.clone();
        }

        let scale = (box_width as f64 / width as f64).max(box_height as f64 / height as f64);
        let filled = if (scale - 1.0).abs() > f64::EPSILON {
            let w = ((width as f64 * scale).ceil() as u32).max(box_width);
            let h = ((height as f64 * scale).ceil() as u32).max(box_height);
            Self::resize_image(img, w, h)
        } else {
            img.clone()
        };

        let (filled_width, filled_height) = filled.dimensions();
        let x = (filled_width - box_width) / 2;
        let y = (filled_height - box_height) / 2;
        filled.crop_imm(x, y, box_width, box_height)
    }

    /// Shrink the longer side by `percent`: scale down into the target box,
    /// then cover-crop it at the center.
    pub fn apply_percent(img: &DynamicImage, percent: ResizePercent) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let dims = Self::target_box(orig_width, orig_height, percent);
        let scaled = Self::scale_down(img, dims);
        let resized = Self::cover(&scaled, dims);

        tracing::debug!(
            percent = percent.get(),
            from_width = orig_width,
            from_height = orig_height,
            to_width = resized.width(),
            to_height = resized.height(),
            "Resized image"
        );

        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn percent(p: u8) -> ResizePercent {
        ResizePercent::new(p).unwrap().unwrap()
    }

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn test_target_box_landscape() {
        let dims = ImageResize::target_box(1000, 500, percent(20));
        assert_eq!(dims.width, Some(800));
        assert_eq!(dims.height, None);
    }

    #[test]
    fn test_target_box_portrait() {
        let dims = ImageResize::target_box(500, 1000, percent(25));
        assert_eq!(dims.width, None);
        assert_eq!(dims.height, Some(750));
    }

    #[test]
    fn test_target_box_square_constrains_width() {
        let dims = ImageResize::target_box(300, 300, percent(10));
        assert_eq!(dims.width, Some(270));
        assert_eq!(dims.height, None);
    }

    #[test]
    fn test_target_box_truncates_and_never_reaches_zero() {
        assert_eq!(ImageResize::target_box(999, 10, percent(33)).width, Some(670));
        assert_eq!(ImageResize::target_box(50, 10, percent(100)).width, Some(1));
    }

    #[test]
    fn test_scale_down_never_upscales() {
        let img = blank(100, 50);
        let dims = ResizeDimensions {
            width: Some(400),
            height: None,
        };
        assert_eq!(ImageResize::scale_down(&img, dims).dimensions(), (100, 50));
    }

    #[test]
    fn test_cover_crops_to_box() {
        let img = blank(200, 100);
        let dims = ResizeDimensions {
            width: Some(50),
            height: Some(50),
        };
        assert_eq!(ImageResize::cover(&img, dims).dimensions(), (50, 50));
    }

    #[test]
    fn test_apply_percent_preserves_aspect_ratio() {
        let img = blank(1000, 500);
        assert_eq!(
            ImageResize::apply_percent(&img, percent(20)).dimensions(),
            (800, 400)
        );

        let img = blank(500, 1000);
        assert_eq!(
            ImageResize::apply_percent(&img, percent(20)).dimensions(),
            (400, 800)
        );
    }
}
