//! Lock and unlock flows.
//!
//! Locking encrypts the payload under a fresh key, stores the ciphertext,
//! splits the key and fans one share out to each keeper. Unlocking gathers or
//! accepts at least K shares, rebuilds the key and decrypts.
//!
//! Keeper calls run concurrently behind a join barrier. Each carries its own
//! deadline, so a dead keeper costs at most one timeout and never blocks its
//! siblings. Quorum is evaluated only after every call has settled.

use crate::config::{BackupPolicy, OrchestratorConfig};
use crate::error::{KeeperFailure, KeeperFailureKind, OrchestratorError, OrchestratorResult};
use crate::keeper_client::KeeperClient;
use crate::storage::ContentStore;
use crate::types::{Crate, CrateMetadata, CrateReceipt};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use timecrate_crypto::{EncryptionKey, Share, combine, decrypt, encrypt, split};
use timecrate_keeper::protocol::ShareResponse;
use timecrate_types::{ContentId, CrateId, CrateRef, Identity, KeeperEndpoint};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Coordinates crate creation and unlocking across keepers.
pub struct Orchestrator {
    config: OrchestratorConfig,
    endpoints: Vec<KeeperEndpoint>,
    content: Arc<dyn ContentStore>,
    keepers: Arc<dyn KeeperClient>,
}

impl Orchestrator {
    /// Validates `config` and builds an orchestrator around the given
    /// collaborators.
    pub fn new(
        config: OrchestratorConfig,
        content: Arc<dyn ContentStore>,
        keepers: Arc<dyn KeeperClient>,
    ) -> OrchestratorResult<Self> {
        let endpoints = config.validate()?;
        Ok(Self {
            config,
            endpoints,
            content,
            keepers,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn keeper_timeout(&self) -> Duration {
        self.config.keeper_timeout()
    }

    // ── Lock ──

    /// Encrypts `payload`, stores it and distributes the key's shares.
    ///
    /// Fails with [`OrchestratorError::InsufficientKeeperQuorum`] unless at
    /// least `threshold` keepers confirm custody. On success the returned
    /// record lists only the keepers that did.
    pub async fn create_crate(
        &self,
        payload: &[u8],
        metadata: CrateMetadata,
    ) -> OrchestratorResult<CrateReceipt> {
        let crate_id = CrateId::new();
        let total = self.config.total_shares;
        let threshold = self.config.threshold;

        let key = EncryptionKey::generate()?;
        info!(
            "locking crate {crate_id}: {} bytes under key {}",
            payload.len(),
            key.masked()
        );
        let ciphertext = encrypt(&key, payload)?;
        let content_id = self
            .content
            .put(&ciphertext)
            .await
            .map_err(OrchestratorError::ContentStore)?;
        debug!("crate {crate_id} ciphertext stored as {content_id}");

        let shares: Vec<Zeroizing<String>> = {
            let key_hex = key.to_hex();
            split(key_hex.as_bytes(), total, threshold)?
                .iter()
                .map(|share| Zeroizing::new(share.encode()))
                .collect()
        };
        drop(key);

        let targets = &self.endpoints[..usize::from(total)];
        let results = join_all(
            targets
                .iter()
                .zip(&shares)
                .map(|(endpoint, share)| self.deliver(endpoint, crate_id, share)),
        )
        .await;

        let mut holders = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();
        for (endpoint, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => holders.push(endpoint.clone()),
                Err(kind) => failures.push(KeeperFailure {
                    endpoint: endpoint.clone(),
                    kind,
                }),
            }
        }

        let required = usize::from(threshold);
        if holders.len() < required {
            warn!(
                "crate {crate_id} abandoned: {} of {required} required keepers took a share",
                holders.len()
            );
            return Err(OrchestratorError::InsufficientKeeperQuorum {
                delivered: holders.len(),
                required,
                failures,
            });
        }
        for failure in &failures {
            warn!("crate {crate_id}: keeper {failure}");
        }

        let backup_shares = match self.config.backup_policy {
            BackupPolicy::ExceptFirstKeeper => shares.into_iter().skip(1).collect(),
            BackupPolicy::All => shares,
            BackupPolicy::None => Vec::new(),
        };

        info!(
            "crate {crate_id} locked with {} of {total} keepers",
            holders.len()
        );
        Ok(CrateReceipt {
            record: Crate {
                crate_id,
                content_id,
                keeper_endpoints: holders,
                threshold,
                total_shares: total,
                release_predicate_ref: None,
                metadata,
                created_at: Utc::now(),
            },
            backup_shares,
        })
    }

    async fn deliver(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        share: &str,
    ) -> Result<(), KeeperFailureKind> {
        let call = self.keepers.store_share(endpoint, crate_id, share);
        match timeout(self.keeper_timeout(), call).await {
            Ok(Ok(outcome)) => {
                debug!("share for crate {crate_id} held by {endpoint} ({outcome:?})");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(KeeperFailureKind::Timeout),
        }
    }

    // ── Unlock ──

    /// Rebuilds the key from caller-supplied shares and decrypts the content.
    ///
    /// The configured threshold is the minimum. A share produced under a
    /// higher threshold raises it, so a crate locked under a larger K still
    /// opens after the configuration changes. Empty strings do not count;
    /// undecodable shares and repeated indices are skipped.
    pub async fn reconstruct<S: AsRef<str>>(
        &self,
        shares: &[S],
        content_id: &ContentId,
    ) -> OrchestratorResult<Vec<u8>> {
        self.reconstruct_with_threshold(shares, content_id, self.config.threshold)
            .await
    }

    async fn reconstruct_with_threshold<S: AsRef<str>>(
        &self,
        shares: &[S],
        content_id: &ContentId,
        threshold: u8,
    ) -> OrchestratorResult<Vec<u8>> {
        let mut required = usize::from(threshold);
        let supplied: Vec<&str> = shares
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if supplied.len() < required {
            return Err(OrchestratorError::InsufficientShares {
                supplied: supplied.len(),
                required,
            });
        }

        let mut selected: Vec<Share> = Vec::with_capacity(required);
        for (position, raw) in supplied.iter().enumerate() {
            let share = match raw.parse::<Share>() {
                Ok(share) => share,
                Err(e) => {
                    warn!("skipping share #{position}: {e}");
                    continue;
                }
            };
            if selected.iter().any(|s| s.index() == share.index()) {
                warn!("skipping share #{position}: repeated index {}", share.index());
                continue;
            }
            required = required.max(usize::from(share.threshold()));
            selected.push(share);
            if selected.len() >= required {
                break;
            }
        }
        if selected.len() < required {
            if supplied.len() < required {
                return Err(OrchestratorError::InsufficientShares {
                    supplied: supplied.len(),
                    required,
                });
            }
            return Err(OrchestratorError::KeyReconstruction(format!(
                "only {} of {required} required shares could be decoded",
                selected.len()
            )));
        }

        debug!("reconstructing key for content {content_id} from {required} shares");
        let key = rebuild_key(&selected)?;
        drop(selected);

        let blob = self
            .content
            .get(content_id)
            .await
            .map_err(OrchestratorError::ContentFetch)?;
        let plaintext = decrypt(&key, &blob).map_err(OrchestratorError::Decryption)?;
        info!("content {content_id} decrypted ({} bytes)", plaintext.len());
        Ok(plaintext)
    }

    /// Asks every custodian of `record` for its share, concurrently.
    ///
    /// Returns the granted shares in keeper order, or
    /// [`OrchestratorError::InsufficientShareGrants`] if fewer than the
    /// crate's threshold were released.
    pub async fn gather_shares(
        &self,
        record: &Crate,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> OrchestratorResult<Vec<Zeroizing<String>>> {
        let results = join_all(
            record
                .keeper_endpoints
                .iter()
                .map(|endpoint| self.request(endpoint, record.crate_id, requester, crate_ref)),
        )
        .await;

        let mut granted = Vec::new();
        let mut failures = Vec::new();
        for (endpoint, result) in record.keeper_endpoints.iter().zip(results) {
            match result {
                Ok(share) => granted.push(share),
                Err(kind) => {
                    debug!("crate {}: keeper {endpoint} {kind}", record.crate_id);
                    failures.push(KeeperFailure {
                        endpoint: endpoint.clone(),
                        kind,
                    });
                }
            }
        }

        let required = usize::from(record.threshold);
        if granted.len() < required {
            warn!(
                "crate {}: {} of {required} required keepers released a share",
                record.crate_id,
                granted.len()
            );
            return Err(OrchestratorError::InsufficientShareGrants {
                granted: granted.len(),
                required,
                failures,
            });
        }
        Ok(granted)
    }

    /// Gathers shares from the crate's keepers and decrypts its content.
    ///
    /// `crate_ref` overrides the reference bound to the record; without
    /// either the call fails with [`OrchestratorError::MissingReleaseRef`].
    pub async fn unlock(
        &self,
        record: &Crate,
        requester: &Identity,
        crate_ref: Option<&CrateRef>,
    ) -> OrchestratorResult<Vec<u8>> {
        let crate_ref = crate_ref
            .or(record.release_predicate_ref.as_ref())
            .ok_or(OrchestratorError::MissingReleaseRef(record.crate_id))?;
        let shares = self.gather_shares(record, requester, crate_ref).await?;
        self.reconstruct_with_threshold(&shares, &record.content_id, record.threshold)
            .await
    }

    async fn request(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> Result<Zeroizing<String>, KeeperFailureKind> {
        let call = self
            .keepers
            .request_share(endpoint, crate_id, requester, crate_ref);
        match timeout(self.keeper_timeout(), call).await {
            Ok(Ok(ShareResponse::Granted { share })) => Ok(Zeroizing::new(share)),
            Ok(Ok(ShareResponse::Denied { reason })) => Err(KeeperFailureKind::Denied(reason)),
            Ok(Ok(ShareResponse::AuthorityUnavailable)) => {
                Err(KeeperFailureKind::AuthorityUnavailable)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(KeeperFailureKind::Timeout),
        }
    }
}

/// Combines shares into the hex-encoded key they were split from.
fn rebuild_key(shares: &[Share]) -> OrchestratorResult<EncryptionKey> {
    let secret = Zeroizing::new(
        combine(shares).map_err(|e| OrchestratorError::KeyReconstruction(e.to_string()))?,
    );
    let encoded = std::str::from_utf8(&secret).map_err(|_| {
        OrchestratorError::KeyReconstruction("combined secret is not a hex key".to_string())
    })?;
    EncryptionKey::from_hex(encoded)
        .map_err(|e| OrchestratorError::KeyReconstruction(e.to_string()))
}
