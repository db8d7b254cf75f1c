//! Client side of the keeper wire protocol.

use crate::error::{OrchestratorError, OrchestratorResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use timecrate_keeper::StoreOutcome;
use timecrate_keeper::protocol::{
    ErrorResponse, ShareRequest, ShareResponse, StoreShareRequest, StoreShareResponse,
};
use timecrate_types::{CrateId, CrateRef, Identity, KeeperEndpoint};

/// A keeper call that produced no protocol answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeeperCallError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("keeper returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Talks to keepers on the orchestrator's behalf.
#[async_trait]
pub trait KeeperClient: Send + Sync {
    async fn store_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        share: &str,
    ) -> Result<StoreOutcome, KeeperCallError>;

    /// Asks a keeper to release its share. Denials and authority outages are
    /// protocol answers, not errors.
    async fn request_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> Result<ShareResponse, KeeperCallError>;
}

/// [`KeeperClient`] over HTTP/JSON.
pub struct HttpKeeperClient {
    client: Client,
}

impl HttpKeeperClient {
    pub fn new(timeout: Duration) -> OrchestratorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn transport(e: reqwest::Error) -> KeeperCallError {
    KeeperCallError::Transport(e.to_string())
}

async fn rejected(resp: reqwest::Response) -> KeeperCallError {
    let status = resp.status().as_u16();
    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => "no error detail".to_string(),
    };
    KeeperCallError::Rejected { status, message }
}

#[async_trait]
impl KeeperClient for HttpKeeperClient {
    async fn store_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        share: &str,
    ) -> Result<StoreOutcome, KeeperCallError> {
        let resp = self
            .client
            .post(endpoint.url("/shares"))
            .json(&StoreShareRequest {
                crate_id,
                share: share.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        let body: StoreShareResponse = resp.json().await.map_err(transport)?;
        Ok(body.outcome)
    }

    async fn request_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> Result<ShareResponse, KeeperCallError> {
        let resp = self
            .client
            .post(endpoint.url(&format!("/shares/{crate_id}/request")))
            .json(&ShareRequest {
                requester: requester.clone(),
                crate_ref: crate_ref.clone(),
            })
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::OK | StatusCode::FORBIDDEN | StatusCode::SERVICE_UNAVAILABLE => {
                resp.json::<ShareResponse>().await.map_err(transport)
            }
            _ => Err(rejected(resp).await),
        }
    }
}

impl From<KeeperCallError> for crate::error::KeeperFailureKind {
    fn from(e: KeeperCallError) -> Self {
        match e {
            KeeperCallError::Transport(e) => Self::Transport(e),
            KeeperCallError::Rejected { status, message } => {
                Self::Rejected(format!("{status}: {message}"))
            }
        }
    }
}
