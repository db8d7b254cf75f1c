//! Persistent crate id → share mapping backed by SQLite.
//!
//! A keeper must outlive restarts without losing its shares, otherwise every
//! crate it served permanently loses one custodian. Each crate id is written
//! once; the first writer wins.

use crate::error::{KeeperError, KeeperResult};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use timecrate_types::CrateId;

/// Result of a successful [`ShareStore::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOutcome {
    /// The share was written.
    Stored,
    /// The identical share was already present; nothing changed.
    Unchanged,
}

/// Share store for a single keeper process.
#[derive(Clone)]
pub struct ShareStore {
    conn: Arc<Mutex<Connection>>,
}

impl ShareStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> KeeperResult<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> KeeperResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> KeeperResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| KeeperError::Storage("share store lock poisoned".to_string()))
    }

    /// Stores `share` for `crate_id`.
    ///
    /// Storing the identical share again is a no-op; storing a different
    /// share for an occupied crate id fails with [`KeeperError::AlreadyStored`].
    pub fn insert(&self, crate_id: &CrateId, share: &str) -> KeeperResult<StoreOutcome> {
        if share.is_empty() {
            return Err(KeeperError::EmptyShare);
        }

        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO shares (crate_id, share, stored_at) VALUES (?1, ?2, ?3)",
            params![crate_id.to_string(), share, Utc::now().timestamp()],
        )?;
        if inserted == 1 {
            return Ok(StoreOutcome::Stored);
        }

        let existing: String = conn.query_row(
            "SELECT share FROM shares WHERE crate_id = ?1",
            params![crate_id.to_string()],
            |row| row.get(0),
        )?;
        if existing == share {
            Ok(StoreOutcome::Unchanged)
        } else {
            Err(KeeperError::AlreadyStored(*crate_id))
        }
    }

    /// Returns the share stored for `crate_id`, byte-for-byte as it was stored.
    pub fn get(&self, crate_id: &CrateId) -> KeeperResult<Option<String>> {
        let conn = self.lock()?;
        let share = conn
            .query_row(
                "SELECT share FROM shares WHERE crate_id = ?1",
                params![crate_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(share)
    }

    /// Number of crates this keeper holds a share for.
    pub fn len(&self) -> KeeperResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM shares", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> KeeperResult<bool> {
        Ok(self.len()? == 0)
    }

}

fn initialize_schema(conn: &Connection) -> KeeperResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS shares (
            crate_id  TEXT PRIMARY KEY NOT NULL,
            share     TEXT NOT NULL,
            stored_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
