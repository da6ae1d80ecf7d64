//! HTTP handlers for the `/api` file operations.
//! Upload bodies are streamed to staging rather than buffered in memory;
//! everything else is delegated to `GatewayService`.

use crate::{
    errors::{AppError, ErrorDetails},
    models::responses::{DownloadLinkResponse, UploadResponse},
    services::{
        gateway_service::{GatewayService, UploadError},
        staging::StagingError,
    },
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};
use futures::StreamExt;
use std::io;
use tracing::warn;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// `GET /api/files` — every object key in the bucket.
pub async fn list_files(
    State(service): State<GatewayService>,
) -> Result<Json<Vec<String>>, AppError> {
    let keys = service
        .list_files()
        .await
        .map_err(|err| AppError::internal("Failed to list files").with_details(err))?;
    Ok(Json(keys))
}

/// `POST /api/upload` — forward the `file` part under its original name.
pub async fn upload_file(
    State(service): State<GatewayService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("upload rejected: {}", rejection);
        no_file()
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        warn!("malformed multipart body: {}", err);
        no_file()
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a file name is a plain form value, not a file.
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()) else {
            continue;
        };
        let key = file_name.to_string();

        let stream = field.map(|chunk| chunk.map_err(|err| io::Error::other(err.to_string())));
        let url = service.upload(&key, stream).await.map_err(upload_error)?;

        return Ok(Json(UploadResponse::success(url)));
    }

    Err(no_file())
}

/// `GET /api/download/{filename}` — a 60-second signed link for `filename`.
///
/// Any signing failure is reported as not found, whatever the provider's
/// actual reason.
pub async fn download_link(
    State(service): State<GatewayService>,
    Path(filename): Path<String>,
) -> Result<Json<DownloadLinkResponse>, AppError> {
    let link = service
        .download_link(&filename)
        .await
        .map_err(|err| AppError::not_found("File not found").with_details(err))?;
    Ok(Json(DownloadLinkResponse { url: link.url }))
}

fn no_file() -> AppError {
    AppError::bad_request("No file uploaded")
}

fn upload_error(err: UploadError) -> AppError {
    match err {
        UploadError::Store(err) => AppError::internal("Upload failed").with_details(err),
        UploadError::Staging(StagingError::Body(err)) => {
            AppError::bad_request("Upload body could not be read").with_details(ErrorDetails {
                details: err.to_string(),
                code: None,
            })
        }
        UploadError::Staging(err) => AppError::internal("Upload failed").with_details(ErrorDetails {
            details: err.to_string(),
            code: None,
        }),
    }
}
