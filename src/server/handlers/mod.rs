//! HTTP handlers for the web console.

mod api;
mod pages;
mod queue;
mod static_files;

pub use api::{api_device_info, api_ocr, api_ocr_url, health};
pub use pages::index;
pub use queue::{queue_admit, queue_clear, queue_process, queue_remove, queue_state};
pub use static_files::{serve_css, serve_js, serve_pdf};
