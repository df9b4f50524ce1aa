//! Static asset constants (CSS and JavaScript).

/// Stylesheet for the upload console.
pub const CSS: &str = include_str!("styles.css");

/// JavaScript driving the upload console against the queue API.
pub const JS: &str = include_str!("scripts.js");
