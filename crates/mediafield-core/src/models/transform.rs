use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Output format requested for recompression of uploaded images.
///
/// `Jpeg` and `Jpg` encode identically; they differ only in the extension
/// given to the stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationFormat {
    Jpeg,
    Jpg,
    Png,
    Webp,
    Gif,
    Avif,
}

impl OptimizationFormat {
    /// Parse a format name. `"none"` and the empty string mean "no optimization".
    pub fn parse(s: &str) -> Result<Option<Self>, SyncError> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            other => other.parse::<Self>().map(Some),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OptimizationFormat::Jpeg => "jpeg",
            OptimizationFormat::Jpg => "jpg",
            OptimizationFormat::Png => "png",
            OptimizationFormat::Webp => "webp",
            OptimizationFormat::Gif => "gif",
            OptimizationFormat::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OptimizationFormat::Jpeg | OptimizationFormat::Jpg => "image/jpeg",
            OptimizationFormat::Png => "image/png",
            OptimizationFormat::Webp => "image/webp",
            OptimizationFormat::Gif => "image/gif",
            OptimizationFormat::Avif => "image/avif",
        }
    }

    pub fn is_jpeg(self) -> bool {
        matches!(self, OptimizationFormat::Jpeg | OptimizationFormat::Jpg)
    }
}

impl FromStr for OptimizationFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" => Ok(OptimizationFormat::Jpeg),
            "jpg" => Ok(OptimizationFormat::Jpg),
            "png" => Ok(OptimizationFormat::Png),
            "webp" => Ok(OptimizationFormat::Webp),
            "gif" => Ok(OptimizationFormat::Gif),
            "avif" => Ok(OptimizationFormat::Avif),
            _ => Err(SyncError::InvalidConfig(format!(
                "Unsupported optimization format: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for OptimizationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Percentage by which the longer side of an image is shrunk (1..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ResizePercent(u8);

impl ResizePercent {
    /// `0` means "no resize"; anything above 100 is rejected.
    pub fn new(percent: u8) -> Result<Option<Self>, SyncError> {
        match percent {
            0 => Ok(None),
            1..=100 => Ok(Some(ResizePercent(percent))),
            _ => Err(SyncError::InvalidConfig(format!(
                "Resize percent must be between 0 and 100, got {}",
                percent
            ))),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<u8> for ResizePercent {
    type Error = SyncError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ResizePercent::new(value)?
            .ok_or_else(|| SyncError::InvalidConfig("Resize percent must not be zero".to_string()))
    }
}

impl From<ResizePercent> for u8 {
    fn from(value: ResizePercent) -> Self {
        value.0
    }
}

/// Transform requested by a field for its uploaded images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParameters {
    pub optimization: Option<OptimizationFormat>,
    pub resize: Option<ResizePercent>,
}

impl TransformParameters {
    pub fn new(optimization: Option<OptimizationFormat>, resize: Option<ResizePercent>) -> Self {
        Self {
            optimization,
            resize,
        }
    }

    /// True when neither optimization nor resize is configured.
    pub fn is_noop(&self) -> bool {
        self.optimization.is_none() && self.resize.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimization_format_parse() {
        assert_eq!(
            OptimizationFormat::parse("jpeg").unwrap(),
            Some(OptimizationFormat::Jpeg)
        );
        assert_eq!(
            OptimizationFormat::parse("JPG").unwrap(),
            Some(OptimizationFormat::Jpg)
        );
        assert_eq!(
            OptimizationFormat::parse("webp").unwrap(),
            Some(OptimizationFormat::Webp)
        );
        assert_eq!(OptimizationFormat::parse("none").unwrap(), None);
        assert_eq!(OptimizationFormat::parse("").unwrap(), None);
        assert!(OptimizationFormat::parse("tiff").is_err());
    }

    #[test]
    fn test_jpeg_variants_share_mime_type() {
        assert!(OptimizationFormat::Jpeg.is_jpeg());
        assert!(OptimizationFormat::Jpg.is_jpeg());
        assert!(!OptimizationFormat::Png.is_jpeg());
        assert_eq!(
            OptimizationFormat::Jpg.mime_type(),
            OptimizationFormat::Jpeg.mime_type()
        );
        assert_eq!(OptimizationFormat::Jpg.extension(), "jpg");
    }

    #[test]
    fn test_resize_percent_bounds() {
        assert_eq!(ResizePercent::new(0).unwrap(), None);
        assert_eq!(ResizePercent::new(20).unwrap().map(|p| p.get()), Some(20));
        assert_eq!(ResizePercent::new(100).unwrap().map(|p| p.get()), Some(100));
        assert!(ResizePercent::new(101).is_err());
    }

    #[test]
    fn test_transform_parameters_noop() {
        assert!(TransformParameters::default().is_noop());
        let params = TransformParameters::new(Some(OptimizationFormat::Png), None);
        assert!(!params.is_noop());
        let params = TransformParameters::new(None, ResizePercent::new(10).unwrap());
        assert!(!params.is_noop());
    }
}
