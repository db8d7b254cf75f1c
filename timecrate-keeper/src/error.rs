//! Keeper error types.

use thiserror::Error;
use timecrate_types::CrateId;

/// Result type for keeper operations.
pub type KeeperResult<T> = Result<T, KeeperError>;

/// Errors that can occur while storing or releasing shares.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("a different share is already stored for crate {0}")]
    AlreadyStored(CrateId),

    #[error("share must not be empty")]
    EmptyShare,

    #[error("authority unavailable: {0}")]
    AuthorityUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
