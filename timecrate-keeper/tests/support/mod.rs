//! Shared helpers for keeper integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use timecrate_keeper::{Keeper, MemoryAuthority, ShareStore, server};
use timecrate_types::{CrateId, CrateRef, Identity};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const OWNER: &str = "0xA11CE";
pub const STRANGER: &str = "0xB0B";
pub const SHARE: &str = "0301deadbeef";

pub fn owner() -> Identity {
    Identity::new(OWNER)
}

pub fn stranger() -> Identity {
    Identity::new(STRANGER)
}

/// Token id used at the authority for a crate.
pub fn token_for(crate_id: &CrateId) -> String {
    format!("token-{crate_id}")
}

pub fn crate_ref(crate_id: CrateId) -> CrateRef {
    CrateRef::new(crate_id, token_for(&crate_id))
}

/// Keeper over an in-memory store and a fresh memory authority.
pub fn keeper() -> (Keeper, Arc<MemoryAuthority>) {
    let authority = Arc::new(MemoryAuthority::new());
    let keeper = Keeper::new(
        "test-keeper",
        ShareStore::open_in_memory().unwrap(),
        authority.clone(),
    );
    (keeper, authority)
}

/// Registers `crate_id` at the authority as owned by [`OWNER`].
pub fn register(authority: &MemoryAuthority, crate_id: &CrateId, ready: bool) {
    authority.set_owner(&token_for(crate_id), owner());
    authority.set_ready(&token_for(crate_id), ready);
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

pub async fn spawn_keeper(keeper: Keeper) -> RunningKeeper {
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
