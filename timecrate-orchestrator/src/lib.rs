//! Crate coordination for timecrate.
//!
//! The orchestrator is the only component that ever sees a whole key, and
//! only for the length of one call:
//!
//! - **Lock**: [`Orchestrator::create_crate`] encrypts a payload under a fresh
//!   key, stores the ciphertext in a [`ContentStore`], splits the key and
//!   hands one share to each keeper through a [`KeeperClient`].
//! - **Unlock**: [`Orchestrator::reconstruct`] rebuilds the key from shares the
//!   caller already holds; [`Orchestrator::unlock`] first collects them from
//!   the crate's keepers, each of which checks ownership and the time lock
//!   with the authority before answering.
//!
//! Keeper endpoints and sharing parameters come from an injected
//! [`OrchestratorConfig`]; the endpoints that actually hold a crate's shares
//! are recorded on its [`Crate`].

pub mod config;
pub mod error;
pub mod keeper_client;
pub mod orchestrator;
pub mod storage;
pub mod types;

pub use config::{BackupPolicy, OrchestratorConfig};
pub use error::{KeeperFailure, KeeperFailureKind, OrchestratorError, OrchestratorResult};
pub use keeper_client::{HttpKeeperClient, KeeperCallError, KeeperClient};
pub use orchestrator::Orchestrator;
pub use storage::{ContentStore, HttpContentStore, MemoryContentStore, StorageError};
pub use types::{Crate, CrateMetadata, CrateReceipt};
