//! Defines the gateway's HTTP surface.
//!
//! ## Structure
//! - **API endpoints**
//!   - `GET    /api/files`               — list object keys in the bucket
//!   - `POST   /api/upload`              — upload the multipart `file` part
//!   - `GET    /api/download/{filename}` — 60-second signed download link
//!
//! - **Probes**: `GET /healthz`, `GET /readyz`
//!
//! Every other path falls through to the static asset directory.

use crate::{
    handlers::{
        file_handlers::{download_link, list_files, upload_file},
        health_handlers::{healthz, readyz},
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Build and return the router for the gateway.
///
/// The router carries shared state (`GatewayService`) to all handlers. Upload
/// size is left to the transport and the store, so the body limit is lifted
/// on the upload route.
pub fn routes(public_dir: &Path) -> Router<GatewayService> {
    let api = Router::new()
        .route("/files", get(list_files))
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/download/{filename}", get(download_link));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api", api)
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
