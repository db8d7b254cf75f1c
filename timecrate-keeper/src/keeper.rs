//! The keeper service: one share per crate, released only on a live check.
//!
//! Authorization is a pure function of the authority's answers at request
//! time. There is no approved flag and no cache, so an ownership transfer or
//! a re-lock takes effect on the very next request.

use crate::authority::{Authority, AuthorityError};
use crate::error::{KeeperError, KeeperResult};
use crate::store::{ShareStore, StoreOutcome};
use std::sync::Arc;
use timecrate_types::{CrateId, CrateRef, DenialReason, Identity};
use tracing::{debug, info, warn};

/// Outcome of a share request that reached a decision.
#[derive(Clone, PartialEq, Eq)]
pub enum ShareDecision {
    /// The stored share, exactly as it was received.
    Granted(String),
    Denied(DenialReason),
}

impl std::fmt::Debug for ShareDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareDecision::Granted(_) => f.write_str("Granted(..)"),
            ShareDecision::Denied(reason) => f.debug_tuple("Denied").field(reason).finish(),
        }
    }
}

/// Combines the two predicate answers into a decision.
///
/// Ownership is judged first so a non-owner learns nothing about the lock
/// state. An unreachable authority is an error, never an implicit allow or
/// deny.
pub fn authorize(
    is_owner: Result<bool, AuthorityError>,
    is_ready: Result<bool, AuthorityError>,
) -> KeeperResult<Option<DenialReason>> {
    match is_owner {
        Err(AuthorityError::Unavailable(e)) => return Err(KeeperError::AuthorityUnavailable(e)),
        Err(AuthorityError::UnknownCrate) => return Ok(Some(DenialReason::UnknownCrate)),
        Ok(false) => return Ok(Some(DenialReason::NotOwner)),
        Ok(true) => {}
    }
    match is_ready {
        Err(AuthorityError::Unavailable(e)) => Err(KeeperError::AuthorityUnavailable(e)),
        Err(AuthorityError::UnknownCrate) => Ok(Some(DenialReason::UnknownCrate)),
        Ok(false) => Ok(Some(DenialReason::NotReady)),
        Ok(true) => Ok(None),
    }
}

/// A keeper process's share custody.
pub struct Keeper {
    id: String,
    store: ShareStore,
    authority: Arc<dyn Authority>,
}

impl Keeper {
    pub fn new(id: impl Into<String>, store: ShareStore, authority: Arc<dyn Authority>) -> Self {
        Self {
            id: id.into(),
            store,
            authority,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Takes custody of `share` for `crate_id`.
    pub async fn store_share(&self, crate_id: CrateId, share: String) -> KeeperResult<StoreOutcome> {
        let store = self.store.clone();
        let outcome = tokio::task::spawn_blocking(move || store.insert(&crate_id, &share))
            .await
            .map_err(|e| KeeperError::Storage(format!("store task failed: {e}")))?;

        match &outcome {
            Ok(StoreOutcome::Stored) => info!("[{}] stored share for crate {crate_id}", self.id),
            Ok(StoreOutcome::Unchanged) => {
                debug!("[{}] share for crate {crate_id} already stored", self.id)
            }
            Err(KeeperError::AlreadyStored(_)) => {
                warn!("[{}] rejected conflicting share for crate {crate_id}", self.id)
            }
            Err(e) => warn!("[{}] failed to store share for crate {crate_id}: {e}", self.id),
        }
        outcome
    }

    /// Releases the share for `crate_id` if `requester` owns the crate and its
    /// time lock has elapsed, evaluated against the authority right now.
    pub async fn request_share(
        &self,
        crate_id: CrateId,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> KeeperResult<ShareDecision> {
        if crate_ref.crate_id != crate_id {
            warn!(
                "[{}] request for crate {crate_id} referenced crate {}",
                self.id, crate_ref.crate_id
            );
            return Ok(ShareDecision::Denied(DenialReason::UnknownCrate));
        }

        let store = self.store.clone();
        let share = tokio::task::spawn_blocking(move || store.get(&crate_id))
            .await
            .map_err(|e| KeeperError::Storage(format!("store task failed: {e}")))??;
        let Some(share) = share else {
            debug!("[{}] no share held for crate {crate_id}", self.id);
            return Ok(ShareDecision::Denied(DenialReason::UnknownCrate));
        };

        let (is_owner, is_ready) = tokio::join!(
            self.authority.is_current_owner(crate_ref, requester),
            self.authority.is_release_ready(crate_ref),
        );

        match authorize(is_owner, is_ready) {
            Ok(None) => {
                info!("[{}] released share for crate {crate_id} to {requester}", self.id);
                Ok(ShareDecision::Granted(share))
            }
            Ok(Some(reason)) => {
                info!(
                    "[{}] denied share for crate {crate_id} to {requester}: {reason}",
                    self.id
                );
                Ok(ShareDecision::Denied(reason))
            }
            Err(e) => {
                warn!("[{}] cannot evaluate crate {crate_id}: {e}", self.id);
                Err(e)
            }
        }
    }

    /// Number of crates in custody.
    pub async fn share_count(&self) -> KeeperResult<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.len())
            .await
            .map_err(|e| KeeperError::Storage(format!("store task failed: {e}")))?
    }
}
