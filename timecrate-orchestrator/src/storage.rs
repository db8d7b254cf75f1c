//! Content store collaborators.
//!
//! The store keeps the encrypted payload and hands back a content id. It never
//! sees the key, so it is trusted only for availability.

use crate::error::{OrchestratorError, OrchestratorResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use timecrate_types::ContentId;
use tracing::debug;

/// Failure reported by a content store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("content {0} not found")]
    NotFound(ContentId),

    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

/// Content-addressed blob storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores `bytes`. Storing identical bytes again yields the same id.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StorageError>;

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StorageError>;
}

/// SHA-256 hex digest used as the content id.
pub fn content_address(bytes: &[u8]) -> ContentId {
    ContentId::new(hex::encode(Sha256::digest(bytes)))
}

/// In-process content store.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: Mutex<HashMap<ContentId, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Replaces a stored blob in place.
    pub fn overwrite(&self, id: &ContentId, bytes: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), bytes);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("content store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StorageError> {
        self.check_available()?;
        let id = content_address(bytes);
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }
}

#[derive(Deserialize)]
struct PutResponse {
    content_id: String,
}

/// Content store reached over HTTP.
///
/// - `POST {base}/content` (octet-stream) → `{"content_id": "…"}`
/// - `GET {base}/content/{id}` → raw bytes
pub struct HttpContentStore {
    client: Client,
    base_url: String,
}

impl HttpContentStore {
    pub fn new(base_url: &str, timeout: Duration) -> OrchestratorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn unavailable(e: impl ToString) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StorageError> {
        let url = format!("{}/content", self.base_url);
        debug!("uploading {} bytes to content store", bytes.len());
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: PutResponse = resp.json().await.map_err(unavailable)?;
        Ok(ContentId::new(body.content_id))
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>, StorageError> {
        let url = format!(
            "{}/content/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        );
        let resp = self.client.get(&url).send().await.map_err(unavailable)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(id.clone())),
            status if status.is_success() => {
                Ok(resp.bytes().await.map_err(unavailable)?.to_vec())
            }
            status => Err(StorageError::Unavailable(format!(
                "content store returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_is_content_addressed_and_idempotent() {
        let store = MemoryContentStore::new();
        let a = store.put(b"payload").await.unwrap();
        let b = store.put(b"payload").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(store.get(&a).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryContentStore::new();
        let id = ContentId::new("missing");
        assert_eq!(store.get(&id).await.unwrap_err(), StorageError::NotFound(id));
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = MemoryContentStore::new();
        let id = store.put(b"x").await.unwrap();
        store.set_unavailable(true);
        assert!(matches!(
            store.get(&id).await,
            Err(StorageError::Unavailable(_))
        ));
    }
}
