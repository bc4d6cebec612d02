//! Stored filename derivation.

use std::path::Path;

use mediafield_core::OptimizationFormat;

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are dropped and anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches('_').is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Replace the extension of `filename` with the one of `format`.
pub fn format_file_name(filename: &str, format: OptimizationFormat) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    format!("{}.{}", stem, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("holiday photo.png"), "holiday_photo.png");
        assert_eq!(sanitize_filename("/tmp/uploads/a-b_c.jpg"), "a-b_c.jpg");
        assert_eq!(sanitize_filename("..png"), "invalid_filename");
        assert_eq!(sanitize_filename("é"), "file");
    }

    #[test]
    fn test_format_file_name() {
        assert_eq!(
            format_file_name("photo.png", OptimizationFormat::Jpeg),
            "photo.jpeg"
        );
        assert_eq!(
            format_file_name("photo.final.png", OptimizationFormat::Webp),
            "photo.final.webp"
        );
        assert_eq!(format_file_name("scan", OptimizationFormat::Jpg), "scan.jpg");
    }
}
