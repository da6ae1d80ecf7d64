//! The seam between the gateway and the storage provider.

use crate::models::signed_link::SignedLink;
use async_trait::async_trait;
use std::{path::Path, time::Duration};
use thiserror::Error;

/// A failure reported by (or while talking to) the object store.
///
/// `code` is the provider's error code (`NoSuchBucket`, `AccessDenied`, ...)
/// when the provider sent one.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub code: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the gateway needs from an S3-compatible bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in the bucket, in provider order.
    async fn list_keys(&self) -> StoreResult<Vec<String>>;

    /// Upload the file at `path` under `key`, replacing any existing object.
    /// Returns the object's location URL.
    async fn put_file(&self, key: &str, path: &Path) -> StoreResult<String>;

    /// Mint a signed GET URL for `key` valid for `expires_in`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedLink>;
}
