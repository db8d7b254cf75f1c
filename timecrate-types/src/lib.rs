//! Shared identifiers for timecrate.
//!
//! These types cross crate and process boundaries (orchestrator, keepers and
//! the external authority), so every one of them serializes transparently as
//! a plain JSON string or a small object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("invalid crate id: {0}")]
    InvalidCrateId(String),
    #[error("invalid keeper endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Identifier of a crate. One key, one content blob and one share per keeper
/// belong to exactly one crate id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrateId(Uuid);

impl CrateId {
    /// Creates a new time-ordered crate id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CrateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CrateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CrateId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TypeError::InvalidCrateId(s.to_string()))
    }
}

/// Identifier returned by the content store for an uploaded ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base URL of a keeper process, e.g. `http://keeper-1.internal:7300`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeeperEndpoint(String);

impl KeeperEndpoint {
    /// Creates an endpoint, dropping any trailing slash.
    pub fn new(url: impl Into<String>) -> Result<Self, TypeError> {
        let url = url.into();
        let trimmed = url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(TypeError::InvalidEndpoint(url));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins an absolute path (starting with `/`) onto the endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl fmt::Display for KeeperEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KeeperEndpoint {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identity of a party requesting a share (for example a wallet address).
///
/// Compared verbatim by the authority; no normalization happens here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a crate's record at the external authority.
///
/// `token_id` is the authority's own handle (for an NFT ledger, the token id);
/// the authority is expected to confirm that the token is bound to `crate_id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrateRef {
    pub crate_id: CrateId,
    pub token_id: String,
}

impl CrateRef {
    pub fn new(crate_id: CrateId, token_id: impl Into<String>) -> Self {
        Self {
            crate_id,
            token_id: token_id.into(),
        }
    }
}

/// Why a keeper refused to release its share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The requester does not currently hold the crate.
    NotOwner,
    /// The crate's time lock has not elapsed.
    NotReady,
    /// The keeper holds no share for this crate, or the authority does not know it.
    UnknownCrate,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenialReason::NotOwner => "not owner",
            DenialReason::NotReady => "not ready",
            DenialReason::UnknownCrate => "unknown crate",
        };
        f.write_str(s)
    }
}
