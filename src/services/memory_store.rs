//! In-memory `ObjectStore` for tests. Mimics a provider that keeps keys in
//! lexicographic order and rejects signing for unknown keys.

use crate::{
    models::signed_link::SignedLink,
    services::object_store::{ObjectStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    presign_expiries: Mutex<Vec<Duration>>,
    calls: AtomicUsize,
    signing_counter: AtomicUsize,
    /// Injected failure returned by every call while set.
    failure: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: StoreError) -> Self {
        let store = Self::default();
        *store.failure.lock().unwrap() = Some(err);
        store
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Total store calls made, of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn presign_expiries(&self) -> Vec<Duration> {
        self.presign_expiries.lock().unwrap().clone()
    }

    fn enter(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        self.enter()?;
        Ok(self.objects.lock().unwrap().keys().cloned().collect())
    }

    async fn put_file(&self, key: &str, path: &Path) -> StoreResult<String> {
        self.enter()?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| StoreError::new(err.to_string(), None))?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("https://test-bucket.s3.us-east-1.amazonaws.com/{}", key))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedLink> {
        self.enter()?;
        self.presign_expiries.lock().unwrap().push(expires_in);
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(StoreError::new(
                "The specified key does not exist.",
                Some("NoSuchKey".into()),
            ));
        }
        let nonce = self.signing_counter.fetch_add(1, Ordering::SeqCst);
        let url = format!(
            "https://test-bucket.s3.us-east-1.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature={:04x}",
            key,
            expires_in.as_secs(),
            nonce
        );
        let valid_for = chrono::Duration::from_std(expires_in)
            .map_err(|err| StoreError::new(err.to_string(), None))?;
        Ok(SignedLink::new(url, Utc::now(), valid_for))
    }
}
