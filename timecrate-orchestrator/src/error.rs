//! Orchestrator error types.

use crate::storage::StorageError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use timecrate_crypto::CryptoError;
use timecrate_types::{CrateId, DenialReason, KeeperEndpoint};

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Why a single keeper call did not produce what was asked of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum KeeperFailureKind {
    /// No answer within the per-keeper deadline.
    Timeout,
    /// Connection refused, reset, DNS failure and the like.
    Transport(String),
    /// The keeper answered with an error status.
    Rejected(String),
    /// The keeper refused to release its share.
    Denied(DenialReason),
    /// The keeper could not reach the authority.
    AuthorityUnavailable,
}

impl fmt::Display for KeeperFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeeperFailureKind::Timeout => f.write_str("timed out"),
            KeeperFailureKind::Transport(e) => write!(f, "transport error: {e}"),
            KeeperFailureKind::Rejected(e) => write!(f, "rejected: {e}"),
            KeeperFailureKind::Denied(reason) => write!(f, "denied: {reason}"),
            KeeperFailureKind::AuthorityUnavailable => f.write_str("authority unavailable"),
        }
    }
}

/// One keeper's failure within a fan-out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeeperFailure {
    pub endpoint: KeeperEndpoint,
    pub kind: KeeperFailureKind,
}

impl fmt::Display for KeeperFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.kind)
    }
}

fn summarize(failures: &[KeeperFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from creating or unlocking a crate.
///
/// Payloads carry counts and endpoints, never share or key material.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("content store rejected the payload: {0}")]
    ContentStore(StorageError),

    #[error(
        "insufficient keeper quorum: {delivered} of {required} required deliveries succeeded ({})",
        summarize(.failures)
    )]
    InsufficientKeeperQuorum {
        delivered: usize,
        required: usize,
        failures: Vec<KeeperFailure>,
    },

    #[error("insufficient shares: {supplied} supplied, {required} required")]
    InsufficientShares { supplied: usize, required: usize },

    #[error("key reconstruction failed: {0}")]
    KeyReconstruction(String),

    #[error("content fetch failed: {0}")]
    ContentFetch(StorageError),

    #[error("decryption failed: {0}")]
    Decryption(CryptoError),

    #[error(
        "insufficient share grants: {granted} of {required} required keepers released a share ({})",
        summarize(.failures)
    )]
    InsufficientShareGrants {
        granted: usize,
        required: usize,
        failures: Vec<KeeperFailure>,
    },

    #[error("crate {0} has no release reference")]
    MissingReleaseRef(CrateId),

    #[error("crate {0} is already bound to a different release reference")]
    ReleaseRefConflict(CrateId),
}
