//! Image type detection for uploads.

use std::path::Path;

/// Extensions the engine accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Whether a path carries one of the accepted image extensions.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decide whether an upload is an image.
///
/// A declared content type wins when present (browsers set it); otherwise the
/// content is sniffed, with the filename extension as a last resort for
/// formats `infer` does not know.
pub fn is_image_upload(name: &str, declared: Option<&str>, bytes: &[u8]) -> bool {
    if let Some(content_type) = declared {
        return content_type.starts_with("image/");
    }
    if infer::is_image(bytes) {
        return true;
    }
    has_image_extension(Path::new(name))
}
