//! `ObjectStore` backed by the AWS SDK, usable against AWS S3 or any
//! S3-compatible provider reachable through a custom endpoint.

use crate::{
    config::AppConfig,
    models::signed_link::SignedLink,
    services::object_store::{ObjectStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::ByteStream,
};
use chrono::Utc;
use std::{fmt::Debug, path::Path, time::Duration};
use tracing::debug;

/// S3 client bound to the single bucket the gateway serves.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3ObjectStore {
    /// Build the SDK client from the gateway configuration.
    ///
    /// Static credentials are used when both key and secret are configured;
    /// otherwise the SDK's default provider chain resolves them.
    pub async fn connect(cfg: &AppConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.region.clone()));

        if let Some((key, secret)) = cfg.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                key,
                secret,
                None,
                None,
                "gateway-config",
            ));
        }
        if let Some(endpoint) = &cfg.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(cfg.endpoint_url.is_some())
            .build();

        Self::with_client(Client::from_conf(s3_config), cfg)
    }

    /// Bind an already-built SDK client to the configured bucket.
    pub fn with_client(client: Client, cfg: &AppConfig) -> Self {
        Self {
            client,
            bucket: cfg.bucket.clone(),
            region: cfg.region.clone(),
            endpoint_url: cfg.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(store_error)?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_owned)),
            );

            // Some providers echo a token on the last page; only follow it
            // while the listing is truncated.
            let truncated = output.is_truncated().unwrap_or(false);
            match output.next_continuation_token() {
                Some(next) if truncated => continuation_token = Some(next.to_owned()),
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn put_file(&self, key: &str, path: &Path) -> StoreResult<String> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| StoreError::new(err.to_string(), None))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(store_error)?;

        Ok(object_location(
            self.endpoint_url.as_deref(),
            &self.bucket,
            &self.region,
            key,
        ))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedLink> {
        let issued_at = Utc::now();
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StoreError::new(err.to_string(), None))?;
        let valid_for = chrono::Duration::from_std(expires_in)
            .map_err(|err| StoreError::new(err.to_string(), None))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(store_error)?;

        debug!("presigned GET for `{}` valid for {:?}", key, expires_in);
        Ok(SignedLink::new(request.uri(), issued_at, valid_for))
    }
}

/// Flatten an SDK failure into the provider message and code.
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let service_error = err.as_service_error();
    let code = service_error.and_then(|e| e.code()).map(str::to_owned);
    let message = service_error
        .and_then(|e| e.message())
        .map(str::to_owned)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    StoreError::new(message, code)
}

/// URL at which an uploaded object lives.
///
/// Virtual-hosted style on AWS, path style behind a custom endpoint. Each key
/// segment is percent-encoded; `/` separators are kept.
fn object_location(endpoint_url: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");

    match endpoint_url {
        Some(endpoint) => format!(
            "{}/{}/{}",
            endpoint.trim_end_matches('/'),
            bucket,
            encoded_key
        ),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            bucket, region, encoded_key
        ),
    }
}
