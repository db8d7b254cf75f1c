//! Crate records produced by the lock flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{OrchestratorError, OrchestratorResult};
use timecrate_types::{ContentId, CrateId, CrateRef, KeeperEndpoint};
use zeroize::Zeroizing;

/// Caller-supplied description of the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateMetadata {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl CrateMetadata {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes,
        }
    }
}

/// A locked crate.
///
/// `keeper_endpoints` is the set of keepers that confirmed custody, in share
/// order. It is fixed at creation and never re-derived from configuration.
/// `release_predicate_ref` names the ledger token whose owner and release
/// time gate the crate; it is unset until the crate is registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crate {
    pub crate_id: CrateId,
    pub content_id: ContentId,
    pub keeper_endpoints: Vec<KeeperEndpoint>,
    pub threshold: u8,
    pub total_shares: u8,
    #[serde(default)]
    pub release_predicate_ref: Option<CrateRef>,
    pub metadata: CrateMetadata,
    pub created_at: DateTime<Utc>,
}

impl Crate {
    /// Binds the ledger token registered for this crate.
    ///
    /// Binding the same token again is a no-op; a different token fails with
    /// [`OrchestratorError::ReleaseRefConflict`].
    pub fn bind_release_ref(
        &mut self,
        token_id: impl Into<String>,
    ) -> OrchestratorResult<&CrateRef> {
        let bound = CrateRef::new(self.crate_id, token_id);
        if let Some(existing) = &self.release_predicate_ref {
            if *existing != bound {
                return Err(OrchestratorError::ReleaseRefConflict(self.crate_id));
            }
        }
        Ok(self.release_predicate_ref.insert(bound))
    }
}

/// Result of a successful `create_crate`.
pub struct CrateReceipt {
    pub record: Crate,
    /// Encoded shares for out-of-band delivery to the content owner.
    pub backup_shares: Vec<Zeroizing<String>>,
}

impl fmt::Debug for CrateReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrateReceipt")
            .field("record", &self.record)
            .field("backup_shares", &format_args!("[{} hidden]", self.backup_shares.len()))
            .finish()
    }
}
