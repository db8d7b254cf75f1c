//! Shared helpers for orchestrator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timecrate_keeper::protocol::ShareResponse;
use timecrate_keeper::{
    Keeper, KeeperError, MemoryAuthority, ShareDecision, ShareStore, StoreOutcome, server,
};
use timecrate_orchestrator::{
    ContentStore, KeeperCallError, KeeperClient, MemoryContentStore, Orchestrator,
    OrchestratorConfig,
};
use timecrate_types::{ContentId, CrateId, CrateRef, Identity, KeeperEndpoint};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const OWNER: &str = "0xA11CE";
pub const HEIR: &str = "0xB0B";

pub fn owner() -> Identity {
    Identity::new(OWNER)
}

pub fn heir() -> Identity {
    Identity::new(HEIR)
}

pub fn token_for(crate_id: &CrateId) -> String {
    format!("token-{crate_id}")
}

pub fn crate_ref(crate_id: CrateId) -> CrateRef {
    CrateRef::new(crate_id, token_for(&crate_id))
}

/// Records the crate at the authority the way the ledger registration would.
pub fn register(authority: &MemoryAuthority, crate_id: &CrateId, ready: bool) {
    authority.set_owner(&token_for(crate_id), owner());
    authority.set_ready(&token_for(crate_id), ready);
}

/// How a simulated keeper misbehaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Connection refused.
    Down,
    /// Accepts the connection and never answers.
    Hang,
}

/// Real keepers behind an in-process [`KeeperClient`], with injectable faults.
pub struct InProcessKeepers {
    keepers: HashMap<KeeperEndpoint, Keeper>,
    endpoints: Vec<String>,
    faults: Mutex<HashMap<KeeperEndpoint, Fault>>,
    pub authority: Arc<MemoryAuthority>,
}

impl InProcessKeepers {
    pub fn new(count: usize) -> Self {
        let authority = Arc::new(MemoryAuthority::new());
        let endpoints: Vec<String> = (1..=count)
            .map(|i| format!("http://keeper-{i}.test"))
            .collect();
        let keepers = endpoints
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let keeper = Keeper::new(
                    format!("keeper-{}", i + 1),
                    ShareStore::open_in_memory().unwrap(),
                    authority.clone(),
                );
                (KeeperEndpoint::new(url.as_str()).unwrap(), keeper)
            })
            .collect();
        Self {
            keepers,
            endpoints,
            faults: Mutex::new(HashMap::new()),
            authority,
        }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.clone()
    }

    pub fn endpoint(&self, index: usize) -> KeeperEndpoint {
        KeeperEndpoint::new(self.endpoints[index].as_str()).unwrap()
    }

    pub fn fail(&self, index: usize, fault: Fault) {
        self.faults.lock().unwrap().insert(self.endpoint(index), fault);
    }

    pub fn heal_all(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub async fn shares_held(&self, index: usize) -> usize {
        self.keepers[&self.endpoint(index)].share_count().await.unwrap()
    }

    async fn reach(&self, endpoint: &KeeperEndpoint) -> Result<&Keeper, KeeperCallError> {
        let fault = self.faults.lock().unwrap().get(endpoint).copied();
        match fault {
            Some(Fault::Down) => Err(KeeperCallError::Transport("connection refused".into())),
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(KeeperCallError::Transport("connection reset".into()))
            }
            None => self
                .keepers
                .get(endpoint)
                .ok_or_else(|| KeeperCallError::Transport(format!("no route to {endpoint}"))),
        }
    }
}

#[async_trait]
impl KeeperClient for InProcessKeepers {
    async fn store_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        share: &str,
    ) -> Result<StoreOutcome, KeeperCallError> {
        let keeper = self.reach(endpoint).await?;
        keeper
            .store_share(crate_id, share.to_string())
            .await
            .map_err(|e| KeeperCallError::Rejected {
                status: match e {
                    KeeperError::AlreadyStored(_) => 409,
                    _ => 500,
                },
                message: e.to_string(),
            })
    }

    async fn request_share(
        &self,
        endpoint: &KeeperEndpoint,
        crate_id: CrateId,
        requester: &Identity,
        crate_ref: &CrateRef,
    ) -> Result<ShareResponse, KeeperCallError> {
        let keeper = self.reach(endpoint).await?;
        match keeper.request_share(crate_id, requester, crate_ref).await {
            Ok(ShareDecision::Granted(share)) => Ok(ShareResponse::Granted { share }),
            Ok(ShareDecision::Denied(reason)) => Ok(ShareResponse::Denied { reason }),
            Err(KeeperError::AuthorityUnavailable(_)) => Ok(ShareResponse::AuthorityUnavailable),
            Err(e) => Err(KeeperCallError::Rejected {
                status: 500,
                message: e.to_string(),
            }),
        }
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub keepers: Arc<InProcessKeepers>,
    pub content: Arc<MemoryContentStore>,
}

impl Harness {
    /// Raw bytes the content store holds for `id`.
    pub async fn content_bytes(&self, id: &ContentId) -> Vec<u8> {
        self.content.get(id).await.unwrap()
    }
}

/// Five in-process keepers, 3-of-5 sharing, one-second keeper deadline.
pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(tweak: impl FnOnce(&mut OrchestratorConfig)) -> Harness {
    let keepers = Arc::new(InProcessKeepers::new(5));
    let content = Arc::new(MemoryContentStore::new());
    let mut config = OrchestratorConfig::with_endpoints(keepers.endpoints());
    config.keeper_timeout_secs = 1;
    tweak(&mut config);
    let orchestrator = Orchestrator::new(config, content.clone(), keepers.clone()).unwrap();
    Harness {
        orchestrator,
        keepers,
        content,
    }
}

/// A keeper serving HTTP on an ephemeral local port.
pub struct RunningKeeper {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for RunningKeeper {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_keeper(name: &str, authority: Arc<MemoryAuthority>) -> RunningKeeper {
    let keeper = Keeper::new(name, ShareStore::open_in_memory().unwrap(), authority);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(server::serve(listener, Arc::new(keeper), async move {
        let _ = rx.await;
    }));
    RunningKeeper {
        base_url: format!("http://{addr}"),
        shutdown: Some(tx),
    }
}
