//! A time-limited download URL minted by the object store.

use chrono::{DateTime, Duration, Utc};

/// A signed GET link for one object.
///
/// The gateway hands the URL to the caller and forgets it; nothing tracks
/// issued links.
#[derive(Clone, Debug)]
pub struct SignedLink {
    /// Provider-generated URL granting read access without further auth.
    pub url: String,

    /// When the link was requested.
    pub issued_at: DateTime<Utc>,

    /// When the provider stops honoring the link.
    pub expires_at: DateTime<Utc>,
}

impl SignedLink {
    pub fn new(url: impl Into<String>, issued_at: DateTime<Utc>, valid_for: Duration) -> Self {
        Self {
            url: url.into(),
            issued_at,
            expires_at: issued_at + valid_for,
        }
    }

    pub fn validity(&self) -> Duration {
        self.expires_at - self.issued_at
    }
}
