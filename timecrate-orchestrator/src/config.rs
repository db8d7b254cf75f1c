//! Orchestrator configuration.

use crate::error::{OrchestratorError, OrchestratorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use timecrate_types::KeeperEndpoint;

/// Which shares `create_crate` hands back for out-of-band delivery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Every share except the one assigned to the first keeper.
    #[default]
    ExceptFirstKeeper,
    All,
    None,
}

/// Configuration for an [`Orchestrator`](crate::Orchestrator).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Keeper base URLs. The first `total_shares` receive one share each.
    pub keeper_endpoints: Vec<String>,

    /// Shares required to rebuild a key (K).
    pub threshold: u8,

    /// Shares produced per crate (N).
    pub total_shares: u8,

    /// Deadline for each individual keeper call (seconds).
    pub keeper_timeout_secs: u64,

    pub backup_policy: BackupPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            keeper_endpoints: Vec::new(),
            threshold: 3,
            total_shares: 5,
            keeper_timeout_secs: 10,
            backup_policy: BackupPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keeper_endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Checks the sharing parameters and parses the endpoint list.
    pub fn validate(&self) -> OrchestratorResult<Vec<KeeperEndpoint>> {
        if self.threshold == 0 {
            return Err(OrchestratorError::Config(
                "threshold must be at least 1".to_string(),
            ));
        }
        if self.threshold > self.total_shares {
            return Err(OrchestratorError::Config(format!(
                "threshold {} exceeds total_shares {}",
                self.threshold, self.total_shares
            )));
        }
        if self.keeper_endpoints.len() < usize::from(self.total_shares) {
            return Err(OrchestratorError::Config(format!(
                "{} keeper endpoints configured, {} shares need one each",
                self.keeper_endpoints.len(),
                self.total_shares
            )));
        }
        if self.keeper_timeout_secs == 0 {
            return Err(OrchestratorError::Config(
                "keeper_timeout_secs must be greater than zero".to_string(),
            ));
        }

        self.keeper_endpoints
            .iter()
            .map(|raw| {
                KeeperEndpoint::new(raw.as_str())
                    .map_err(|e| OrchestratorError::Config(format!("{raw:?}: {e}")))
            })
            .collect()
    }

    pub fn keeper_timeout(&self) -> Duration {
        Duration::from_secs(self.keeper_timeout_secs)
    }
}
