//! Page handlers.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};

use super::super::templates;
use super::super::AppState;

/// Upload console page.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    // Snapshot the queue for the initial render; the page keeps itself in
    // sync through the queue API afterwards.
    let rows = match state.tracker.try_lock() {
        Ok(tracker) => tracker.render(),
        Err(_) => Vec::new(),
    };

    Html(templates::index_page(&rows))
}
