//! GatewayService — maps the three gateway operations onto the object store.
//!
//! Holds no per-request state. The only local resource is the staging
//! directory, whose files are owned by [`StagedFile`] guards.

use crate::{
    models::signed_link::SignedLink,
    services::{
        object_store::{ObjectStore, StoreError, StoreResult},
        staging::{StagedFile, StagingArea, StagingError},
    },
};
use bytes::Bytes;
use futures::Stream;
use std::{io, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info};

/// Validity window of every signed download link.
pub const SIGNED_LINK_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct GatewayService {
    store: Arc<dyn ObjectStore>,
    staging: StagingArea,
}

impl GatewayService {
    pub fn new(store: Arc<dyn ObjectStore>, staging: StagingArea) -> Self {
        Self { store, staging }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// All object keys in the bucket, in provider order.
    pub async fn list_files(&self) -> StoreResult<Vec<String>> {
        match self.store.list_keys().await {
            Ok(keys) => {
                info!("listed {} objects", keys.len());
                Ok(keys)
            }
            Err(err) => {
                error!("store list error: {} (code {:?})", err, err.code);
                Err(err)
            }
        }
    }

    /// Stage `body`, forward it under `key`, and return the object location.
    ///
    /// `key` is used verbatim; an existing object with the same key is
    /// replaced. The staged copy is removed once the store call returns,
    /// whatever its outcome.
    pub async fn upload<S>(&self, key: &str, body: S) -> Result<String, UploadError>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let staged: StagedFile = self.staging.stage(body).await?;
        let size_bytes = staged.size_bytes();

        let result = self.store.put_file(key, staged.path()).await;
        drop(staged);

        match result {
            Ok(location) => {
                info!("uploaded `{}` ({} bytes) to {}", key, size_bytes, location);
                Ok(location)
            }
            Err(err) => {
                error!("store upload error for `{}`: {} (code {:?})", key, err, err.code);
                Err(err.into())
            }
        }
    }

    /// Mint a signed GET link for `key`. No existence check is made here;
    /// whether an unknown key fails now or on first use is up to the provider.
    pub async fn download_link(&self, key: &str) -> StoreResult<SignedLink> {
        match self.store.presign_get(key, SIGNED_LINK_TTL).await {
            Ok(link) => {
                info!(
                    "signed `{}` for {}s (until {})",
                    key,
                    link.validity().num_seconds(),
                    link.expires_at
                );
                Ok(link)
            }
            Err(err) => {
                error!("store signing error for `{}`: {} (code {:?})", key, err, err.code);
                Err(err)
            }
        }
    }
}
