//! The network collaborator: fetch image bytes by URL.
//!
//! The bundle step only needs `url -> bytes | failure`, so that is the whole
//! trait. Keeping it object-safe behind `Arc<dyn ImageFetcher>` lets tests
//! simulate failures at arbitrary positions in the fetch loop without any
//! network, and lets embedders wrap the default client with caching or
//! auth headers.

use async_trait::async_trait;
use std::time::Duration;

/// A failed fetch. Not a [`crate::error::MergeError`] — per-image failures
/// are tallied, never propagated.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout).
    #[error("request failed: {reason}")]
    Transport { reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16 },
}

/// Fetch raw bytes for an image URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Default fetcher backed by a shared [`reqwest::Client`].
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with a per-request timeout.
    ///
    /// Falls back to a default client if the builder fails (it only fails on
    /// TLS backend misconfiguration, which would surface on first request
    /// anyway).
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}
