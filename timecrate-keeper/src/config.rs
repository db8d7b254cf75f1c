//! Keeper process configuration.

use crate::error::{KeeperError, KeeperResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a keeper process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Name used in logs and the health response.
    pub keeper_id: String,

    /// Address the HTTP surface binds to.
    pub listen_addr: String,

    /// SQLite file holding this keeper's shares.
    pub store_path: PathBuf,

    /// Base URL of the external authority.
    pub authority_base_url: String,

    /// Per-call timeout for authority queries (seconds).
    pub authority_timeout_secs: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            keeper_id: "keeper".to_string(),
            listen_addr: "127.0.0.1:7300".to_string(),
            store_path: PathBuf::from("keeper-shares.db"),
            authority_base_url: "http://127.0.0.1:7400".to_string(),
            authority_timeout_secs: 5,
        }
    }
}

impl KeeperConfig {
    /// Loads the config from an optional JSON file, then applies
    /// `TIMECRATE_KEEPER_*` environment overrides.
    pub fn load(path: Option<&Path>) -> KeeperResult<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup (normally the process env).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> KeeperResult<()> {
        if let Some(v) = lookup("TIMECRATE_KEEPER_ID") {
            self.keeper_id = v;
        }
        if let Some(v) = lookup("TIMECRATE_KEEPER_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("TIMECRATE_KEEPER_STORE_PATH") {
            self.store_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TIMECRATE_KEEPER_AUTHORITY_URL") {
            self.authority_base_url = v;
        }
        if let Some(v) = lookup("TIMECRATE_KEEPER_AUTHORITY_TIMEOUT_SECS") {
            self.authority_timeout_secs = v.parse().map_err(|_| {
                KeeperError::Config(format!("authority timeout must be an integer, got {v:?}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> KeeperResult<()> {
        if self.authority_timeout_secs == 0 {
            return Err(KeeperError::Config(
                "authority_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(self.authority_base_url.starts_with("http://")
            || self.authority_base_url.starts_with("https://"))
        {
            return Err(KeeperError::Config(format!(
                "authority_base_url must be an http(s) URL, got {:?}",
                self.authority_base_url
            )));
        }
        if self.keeper_id.is_empty() {
            return Err(KeeperError::Config("keeper_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn authority_timeout(&self) -> Duration {
        Duration::from_secs(self.authority_timeout_secs)
    }
}
