//! JSON bodies exchanged with a keeper over HTTP.
//!
//! Share values travel as opaque strings and are never re-encoded on either
//! side.

use crate::store::StoreOutcome;
use serde::{Deserialize, Serialize};
use timecrate_types::{CrateId, CrateRef, DenialReason, Identity};

/// `POST /shares`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreShareRequest {
    pub crate_id: CrateId,
    pub share: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreShareResponse {
    pub outcome: StoreOutcome,
}

/// `POST /shares/{crate_id}/request`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareRequest {
    pub requester: Identity,
    pub crate_ref: CrateRef,
}

/// Answer to a [`ShareRequest`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShareResponse {
    Granted { share: String },
    Denied { reason: DenialReason },
    AuthorityUnavailable,
}

impl std::fmt::Debug for ShareResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareResponse::Granted { .. } => f.write_str("Granted { .. }"),
            ShareResponse::Denied { reason } => {
                f.debug_struct("Denied").field("reason", reason).finish()
            }
            ShareResponse::AuthorityUnavailable => f.write_str("AuthorityUnavailable"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /health`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub keeper: String,
    pub shares: usize,
}
