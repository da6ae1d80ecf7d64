//! JSON bodies returned by the `/api` handlers.

use serde::Serialize;

/// Body of a successful `POST /api/upload`.
#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub message: String,

    /// Location of the stored object as reported by the store.
    pub url: String,
}

impl UploadResponse {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            message: "Upload successful".into(),
            url: url.into(),
        }
    }
}

/// Body of a successful `GET /api/download/{filename}`.
#[derive(Serialize, Debug)]
pub struct DownloadLinkResponse {
    pub url: String,
}
