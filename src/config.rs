//! Configuration management for ocrelay.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default OCR engine base address.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:5000";

/// Default language hint for relay submissions.
pub const DEFAULT_LANGUAGES: &str = "en";

/// Language hint used by the upload queue.
pub const DEFAULT_UPLOAD_LANGUAGES: &str = "tr,en";

/// Maximum number of files in the upload queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Maximum accepted upload size (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Runtime settings.
///
/// Loaded from `ocrelay.toml` when present, then overridden by `OCRELAY_*`
/// environment variables. Every field has a default so an empty file (or no
/// file at all) is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base address of the OCR engine (no trailing slash required).
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Comma-separated language codes sent when a caller leaves them unset.
    #[serde(default = "default_languages")]
    pub languages: String,

    /// Language hint the upload queue sends for every candidate.
    #[serde(default = "default_upload_languages")]
    pub upload_languages: String,

    /// Bind address for the web console (port, host, or host:port).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory the engine writes OCR PDF artifacts to, served under /pdf.
    #[serde(default = "default_pdf_dir")]
    pub pdf_dir: PathBuf,

    /// Upload queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// HTTP timeout for engine calls, in seconds. OCR is slow on CPU.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_engine_url() -> String {
    DEFAULT_ENGINE_URL.to_string()
}

fn default_languages() -> String {
    DEFAULT_LANGUAGES.to_string()
}

fn default_upload_languages() -> String {
    DEFAULT_UPLOAD_LANGUAGES.to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3030".to_string()
}

fn default_pdf_dir() -> PathBuf {
    PathBuf::from("pdf")
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            languages: default_languages(),
            upload_languages: default_upload_languages(),
            bind: default_bind(),
            pdf_dir: default_pdf_dir(),
            queue_capacity: default_queue_capacity(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    /// Apply `OCRELAY_*` environment overrides.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OCRELAY_ENGINE_URL") {
            self.engine_url = url;
        }
        if let Ok(langs) = std::env::var("OCRELAY_LANGS") {
            self.languages = langs;
        }
        if let Ok(langs) = std::env::var("OCRELAY_UPLOAD_LANGS") {
            self.upload_languages = langs;
        }
        if let Ok(bind) = std::env::var("OCRELAY_BIND") {
            self.bind = bind;
        }
        if let Ok(dir) = std::env::var("OCRELAY_PDF_DIR") {
            self.pdf_dir = PathBuf::from(dir);
        }
    }
}

/// Load settings from an optional config file plus environment overrides.
///
/// An explicitly given path must exist; the implicit `ocrelay.toml` in the
/// working directory is used only when present.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("cannot parse {}: {}", path.display(), e))?
        }
        None => {
            let implicit = Path::new("ocrelay.toml");
            if implicit.exists() {
                let raw = fs::read_to_string(implicit)?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("cannot parse ocrelay.toml: {}", e))?
            } else {
                Settings::default()
            }
        }
    };

    settings.apply_env();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_contract() {
        let settings = Settings::default();
        assert_eq!(settings.engine_url, "http://localhost:5000");
        assert_eq!(settings.languages, "en");
        assert_eq!(settings.upload_languages, "tr,en");
        assert_eq!(settings.queue_capacity, 5);
        assert_eq!(settings.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let parsed: Settings = toml::from_str("").unwrap();
        assert_eq!(parsed.engine_url, Settings::default().engine_url);
        assert_eq!(parsed.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let parsed: Settings = toml::from_str("engine_url = \"http://ocr:9000\"").unwrap();
        assert_eq!(parsed.engine_url, "http://ocr:9000");
        assert_eq!(parsed.languages, "en");
    }
}
