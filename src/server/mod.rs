//! Web console for the OCR relay.
//!
//! Serves the upload page, the queue API backing it, the one-shot OCR
//! endpoints, the engine device-info proxy and generated PDF artifacts.

mod assets;
mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Settings;
use crate::relay::{OcrRelay, RelayError};
use crate::tracker::UploadTracker;

/// Shared state for the web server.
///
/// The tracker is the single upload queue of the console; it lives behind a
/// mutex that `process` holds for a whole batch run, so queue mutation has
/// exactly one writer at a time.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<OcrRelay>,
    pub tracker: Arc<Mutex<UploadTracker>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, RelayError> {
        let relay = OcrRelay::new(&settings)?;
        let tracker = UploadTracker::new(settings.queue_capacity);

        Ok(Self {
            relay: Arc::new(relay),
            tracker: Arc::new(Mutex::new(tracker)),
            settings: Arc::new(settings),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings.clone())?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
