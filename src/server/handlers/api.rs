//! One-shot OCR API handlers.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::super::AppState;
use crate::models::DeviceReport;
use crate::relay::RelayError;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Build a JSON error response. A present `error` field marks a logical
/// failure for clients regardless of the status code.
fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn relay_error_response(error: RelayError) -> Response {
    let status = match &error {
        RelayError::EmptyImage | RelayError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::warn!("relay call failed: {}", error);
    }
    error_response(status, error.to_string())
}

/// `POST /api/ocr` - relay one multipart-uploaded image to the engine.
///
/// Expects an `image` file part and an optional `langs` text part; the queue
/// language hint is used when `langs` is missing.
pub async fn api_ocr(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut langs: Option<String> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                match name.as_str() {
                    "image" => {
                        let filename = field.file_name().unwrap_or_default().to_string();
                        match field.bytes().await {
                            Ok(bytes) => image = Some((filename, bytes.to_vec())),
                            Err(e) => {
                                return error_response(
                                    StatusCode::BAD_REQUEST,
                                    format!("cannot read image part: {}", e),
                                );
                            }
                        }
                    }
                    "langs" => {
                        langs = field.text().await.ok();
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid multipart body: {}", e),
                );
            }
        }
    }

    let Some((filename, bytes)) = image else {
        return error_response(StatusCode::BAD_REQUEST, "no image part".to_string());
    };
    if filename.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no selected file".to_string());
    }

    let langs = langs.unwrap_or_else(|| state.settings.upload_languages.clone());

    match state.relay.submit(&bytes, &filename, &langs).await {
        Ok(output) => Json(json!({
            "success": true,
            "text": output.text,
            "details": output.details,
        }))
        .into_response(),
        Err(e) => relay_error_response(e),
    }
}

/// Request body for URL-based OCR.
#[derive(Debug, Deserialize)]
pub struct OcrUrlRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub languages: Option<String>,
}

/// `POST /api/ocr-url` - fetch an image URL and relay it to the engine.
pub async fn api_ocr_url(
    State(state): State<AppState>,
    Json(request): Json<OcrUrlRequest>,
) -> Response {
    let languages = request
        .languages
        .unwrap_or_else(|| state.settings.languages.clone());

    match state.relay.submit_url(&request.image_url, &languages).await {
        Ok(output) => Json(json!({
            "success": true,
            "text": output.text,
            "details": output.details,
        }))
        .into_response(),
        Err(e) => relay_error_response(e),
    }
}

/// `GET /api/device-info` - what the engine runs on.
///
/// Fetch failures degrade to a static CPU report; this endpoint never blocks
/// OCR functionality.
pub async fn api_device_info(State(state): State<AppState>) -> Json<DeviceReport> {
    match state.relay.device_info().await {
        Ok(report) => Json(report),
        Err(e) => {
            tracing::debug!("device info unavailable: {}", e);
            Json(DeviceReport::cpu_fallback())
        }
    }
}
