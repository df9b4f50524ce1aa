//! Shared utility functions.

mod html;
mod mime;

pub use html::html_escape;
pub use mime::{has_image_extension, is_image_upload, IMAGE_EXTENSIONS};
