//! Share keeper for timecrate.
//!
//! A keeper is an independently operated process that holds exactly one
//! share per crate and releases it only when the external authority says,
//! at the moment of the request, that:
//! - the requester currently owns the crate, and
//! - the crate's time lock has elapsed.
//!
//! Shares persist in SQLite so a restarted keeper keeps serving the crates it
//! was given. The HTTP surface lives in [`server`]; the `keeperd` binary
//! wires everything together from a [`KeeperConfig`].

pub mod authority;
pub mod config;
pub mod error;
pub mod keeper;
pub mod protocol;
pub mod server;
pub mod store;

pub use authority::{Authority, AuthorityError, HttpAuthority, MemoryAuthority};
pub use config::KeeperConfig;
pub use error::{KeeperError, KeeperResult};
pub use keeper::{Keeper, ShareDecision, authorize};
pub use store::{ShareStore, StoreOutcome};
