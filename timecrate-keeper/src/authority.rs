//! External authority predicates.
//!
//! The authority (an ownership ledger with time-lock bookkeeping) answers two
//! read-only questions about a crate. Keepers ask both on every share request
//! and never cache the answers.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use timecrate_types::{CrateRef, Identity};
use tracing::debug;

use crate::error::{KeeperError, KeeperResult};

/// Failure to obtain an answer from the authority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    #[error("authority unreachable: {0}")]
    Unavailable(String),

    #[error("authority does not know this crate")]
    UnknownCrate,
}

/// Read-only predicates consulted before a share is released.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Whether `identity` holds the crate right now.
    async fn is_current_owner(
        &self,
        crate_ref: &CrateRef,
        identity: &Identity,
    ) -> Result<bool, AuthorityError>;

    /// Whether the crate's time lock has elapsed.
    async fn is_release_ready(&self, crate_ref: &CrateRef) -> Result<bool, AuthorityError>;
}

#[derive(Deserialize)]
struct OwnerResponse {
    is_owner: bool,
}

#[derive(Deserialize)]
struct ReadyResponse {
    ready: bool,
}

/// Authority reached over HTTP.
///
/// - `GET {base}/crates/{token_id}/owner?identity=…` → `{"is_owner": bool}`
/// - `GET {base}/crates/{token_id}/ready` → `{"ready": bool}`
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    pub fn new(base_url: &str, timeout: Duration) -> KeeperResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeeperError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn crate_url(&self, crate_ref: &CrateRef, leaf: &str) -> String {
        format!(
            "{}/crates/{}/{leaf}",
            self.base_url,
            urlencoding::encode(&crate_ref.token_id)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AuthorityError> {
        let resp = request
            .send()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(AuthorityError::UnknownCrate),
            status if status.is_success() => resp.json::<T>().await.map_err(|e| {
                AuthorityError::Unavailable(format!("malformed authority response: {e}"))
            }),
            status => Err(AuthorityError::Unavailable(format!(
                "authority returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn is_current_owner(
        &self,
        crate_ref: &CrateRef,
        identity: &Identity,
    ) -> Result<bool, AuthorityError> {
        let url = self.crate_url(crate_ref, "owner");
        debug!("checking owner of {} for {identity}", crate_ref.token_id);
        let resp: OwnerResponse = self
            .get_json(
                self.client
                    .get(&url)
                    .query(&[("identity", identity.as_str())]),
            )
            .await?;
        Ok(resp.is_owner)
    }

    async fn is_release_ready(&self, crate_ref: &CrateRef) -> Result<bool, AuthorityError> {
        let url = self.crate_url(crate_ref, "ready");
        let resp: ReadyResponse = self.get_json(self.client.get(&url)).await?;
        Ok(resp.ready)
    }
}

/// In-process authority whose answers can be flipped at any time.
///
/// Used for local development and tests. Counts every predicate call so
/// callers can verify nothing is cached.
#[derive(Default)]
pub struct MemoryAuthority {
    owners: Mutex<HashMap<String, Identity>>,
    ready: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or transfers) a token to `owner`.
    pub fn set_owner(&self, token_id: &str, owner: Identity) {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token_id.to_string(), owner);
    }

    pub fn set_ready(&self, token_id: &str, ready: bool) {
        let mut set = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        if ready {
            set.insert(token_id.to_string());
        } else {
            set.remove(token_id);
        }
    }

    /// Makes every subsequent call fail with [`AuthorityError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of predicate evaluations served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), AuthorityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthorityError::Unavailable("authority offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Authority for MemoryAuthority {
    async fn is_current_owner(
        &self,
        crate_ref: &CrateRef,
        identity: &Identity,
    ) -> Result<bool, AuthorityError> {
        self.check_available()?;
        let owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        match owners.get(&crate_ref.token_id) {
            Some(owner) => Ok(owner == identity),
            None => Err(AuthorityError::UnknownCrate),
        }
    }

    async fn is_release_ready(&self, crate_ref: &CrateRef) -> Result<bool, AuthorityError> {
        self.check_available()?;
        if !self
            .owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&crate_ref.token_id)
        {
            return Err(AuthorityError::UnknownCrate);
        }
        Ok(self
            .ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&crate_ref.token_id))
    }
}
