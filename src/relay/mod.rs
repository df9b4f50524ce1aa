//! Relay client for the OCR engine's HTTP contract.
//!
//! Adapts three byte-acquisition shapes (disk path, in-memory buffer, URL
//! fetch) onto a single multipart POST against `{base}/ocr`. The relay is
//! stateless: one outbound call per submission, no retry, no cache.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::config::{Settings, DEFAULT_LANGUAGES};
use crate::models::{DeviceReport, OcrOutput};

/// User agent sent with every engine call.
const USER_AGENT: &str = concat!("ocrelay/", env!("CARGO_PKG_VERSION"));

/// Filename used when one cannot be derived from a URL.
const FALLBACK_FILENAME: &str = "image.png";

/// Errors from relay submissions.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("empty image payload")]
    EmptyImage,

    #[error("request to OCR engine failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OCR engine returned {status}: {body}")]
    EngineStatus { status: u16, body: String },

    #[error("malformed OCR engine response: {0}")]
    MalformedResponse(String),

    #[error("invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that turns image bytes into recognized text.
///
/// The tracker depends on this seam rather than on the concrete relay, so
/// batch processing can be exercised against a scripted stand-in.
#[async_trait]
pub trait TextRecognition: Send + Sync {
    /// Recognize text in one image.
    async fn recognize(
        &self,
        image: &[u8],
        filename: &str,
        languages: &str,
    ) -> Result<OcrOutput, RelayError>;
}

/// HTTP client for a single OCR engine instance.
#[derive(Debug, Clone)]
pub struct OcrRelay {
    client: Client,
    base_url: String,
}

impl OcrRelay {
    /// Create a relay against the configured engine address.
    pub fn new(settings: &Settings) -> Result<Self, RelayError> {
        Self::with_base_url(
            &settings.engine_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Create a relay against an explicit base address.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Engine base address this relay talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one image to the engine.
    ///
    /// Builds a multipart body with an `image` part carrying the raw bytes
    /// under `filename` (the engine uses the name for type inference only)
    /// and a `langs` text part. Empty language strings fall back to the
    /// engine default.
    pub async fn submit(
        &self,
        image: &[u8],
        filename: &str,
        languages: &str,
    ) -> Result<OcrOutput, RelayError> {
        if image.is_empty() {
            return Err(RelayError::EmptyImage);
        }

        let languages = if languages.trim().is_empty() {
            DEFAULT_LANGUAGES
        } else {
            languages
        };

        let form = Form::new()
            .part(
                "image",
                Part::bytes(image.to_vec()).file_name(filename.to_string()),
            )
            .text("langs", languages.to_string());

        tracing::debug!(
            filename,
            languages,
            bytes = image.len(),
            "submitting image to OCR engine"
        );

        let response = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::EngineStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| RelayError::MalformedResponse(e.to_string()))
    }

    /// Submit an image file from disk, using its base filename.
    pub async fn submit_path(
        &self,
        path: &Path,
        languages: &str,
    ) -> Result<OcrOutput, RelayError> {
        let image = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(FALLBACK_FILENAME);
        self.submit(&image, filename, languages).await
    }

    /// Fetch an image URL and submit its body.
    ///
    /// The fetch is a separate, unauthenticated GET; the filename is derived
    /// from the URL's path component.
    pub async fn submit_url(&self, url: &str, languages: &str) -> Result<OcrOutput, RelayError> {
        let parsed = Url::parse(url).map_err(|e| RelayError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let filename = filename_from_url(&parsed);

        let response = self.client.get(parsed).send().await?.error_for_status()?;
        let image = response.bytes().await?;

        self.submit(&image, &filename, languages).await
    }

    /// Ask the engine what it runs on. Informational only; callers fall back
    /// to a static CPU label on failure.
    pub async fn device_info(&self) -> Result<DeviceReport, RelayError> {
        let response = self
            .client
            .get(format!("{}/api/device-info", self.base_url))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::EngineStatus {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| RelayError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TextRecognition for OcrRelay {
    async fn recognize(
        &self,
        image: &[u8],
        filename: &str,
        languages: &str,
    ) -> Result<OcrOutput, RelayError> {
        self.submit(image, filename, languages).await
    }
}

/// Derive a filename from a URL's path component.
fn filename_from_url(url: &Url) -> String {
    let raw = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");

    let decoded = urlencoding::decode(raw)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    if decoded.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        decoded
    }
}

/// Truncate an error body so status errors stay readable in logs and UIs.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> OcrRelay {
        OcrRelay::with_base_url("http://localhost:5000/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_is_trimmed() {
        assert_eq!(relay().base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn empty_image_is_rejected_locally() {
        let err = relay().submit(&[], "a.png", "en").await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyImage));
    }

    #[tokio::test]
    async fn unparseable_url_is_rejected_locally() {
        let err = relay().submit_url("not a url", "en").await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidUrl { .. }));
    }

    #[test]
    fn filename_from_simple_url() {
        let url = Url::parse("https://example.com/images/receipt.png").unwrap();
        assert_eq!(filename_from_url(&url), "receipt.png");
    }

    #[test]
    fn filename_is_percent_decoded() {
        let url = Url::parse("https://example.com/f/fi%C5%9F%20taramas%C4%B1.jpg").unwrap();
        assert_eq!(filename_from_url(&url), "fiş taraması.jpg");
    }

    #[test]
    fn filename_falls_back_when_path_is_bare() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(filename_from_url(&url), FALLBACK_FILENAME);
        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(filename_from_url(&url), FALLBACK_FILENAME);
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = snippet(&long);
        assert!(cut.len() < 210);
        assert!(cut.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }
}
