//! Upload queue handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::mpsc;

use super::super::AppState;
use crate::models::SelectedFile;
use crate::tracker::TrackerEvent;

/// `GET /api/queue` - current queue projection.
///
/// While a batch run holds the tracker, the queue reports busy instead of
/// blocking behind the processing lock.
pub async fn queue_state(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.tracker.try_lock() {
        Ok(tracker) => Json(json!({
            "busy": false,
            "capacity": tracker.capacity(),
            "files": tracker.render(),
        })),
        Err(_) => Json(json!({
            "busy": true,
            "capacity": state.settings.queue_capacity,
            "files": [],
        })),
    }
}

/// `POST /api/queue` - admit uploaded files into the queue.
pub async fn queue_admit(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut batch = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => batch.push(SelectedFile {
                        name: filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    }),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": format!("cannot read {}: {}", filename, e) })),
                        )
                            .into_response();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid multipart body: {}", e) })),
                )
                    .into_response();
            }
        }
    }

    let mut tracker = state.tracker.lock().await;
    match tracker.admit(batch) {
        Ok(report) => Json(json!({
            "admitted": report.admitted,
            "messages": report
                .skipped
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            "files": tracker.render(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string(), "files": tracker.render() })),
        )
            .into_response(),
    }
}

/// `DELETE /api/queue/{index}` - remove one candidate.
pub async fn queue_remove(State(state): State<AppState>, Path(index): Path<usize>) -> Response {
    let mut tracker = state.tracker.lock().await;
    match tracker.remove(index) {
        Some(name) => Json(json!({
            "removed": name,
            "files": tracker.render(),
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no file at index {}", index) })),
        )
            .into_response(),
    }
}

/// `POST /api/queue/clear` - drop every candidate.
pub async fn queue_clear(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut tracker = state.tracker.lock().await;
    tracker.clear();
    Json(json!({ "files": [] }))
}

/// `POST /api/queue/process` - run the queue, strictly one file at a time.
///
/// Holds the tracker for the whole run; a second process request while one
/// is in flight gets 409 instead of queueing up behind the lock.
pub async fn queue_process(State(state): State<AppState>) -> Response {
    let Ok(mut tracker) = state.tracker.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "processing is already running" })),
        )
            .into_response();
    };

    let (tx, mut rx) = mpsc::channel::<TrackerEvent>(32);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let report = tracker
        .process_all(
            state.relay.as_ref(),
            &state.settings.upload_languages,
            tx,
        )
        .await;

    Json(json!({
        "success": true,
        "processed": report.processed,
        "completed": report.completed,
        "failed": report.failed,
        "skipped": report.skipped,
        "averageSecs": report.average.map(|d| d.as_secs_f64()),
        "aggregate": report.aggregate,
        "files": tracker.render(),
    }))
    .into_response()
}

fn log_event(event: &TrackerEvent) {
    match event {
        TrackerEvent::BatchStarted { total } => {
            tracing::info!("processing {} queued files", total);
        }
        TrackerEvent::CandidateStarted { name, .. } => {
            tracing::info!("OCR started for {}", name);
        }
        TrackerEvent::CandidateCompleted {
            name, elapsed_ms, ..
        } => {
            tracing::info!("OCR completed for {} in {}ms", name, elapsed_ms);
        }
        TrackerEvent::CandidateFailed { name, error, .. } => {
            tracing::warn!("OCR failed for {}: {}", name, error);
        }
        TrackerEvent::CandidateSkipped { name, .. } => {
            tracing::debug!("{} already completed, kept stored result", name);
        }
        TrackerEvent::BatchFinished {
            completed,
            failed,
            skipped,
        } => {
            tracing::info!(
                "batch finished: {} completed, {} failed, {} skipped",
                completed,
                failed,
                skipped
            );
        }
    }
}
