use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::utils::time::SECONDS_PER_DAY;

/// Tunables of a governance deployment, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub node_name: String,

    /// Share of live total capacity that must have voted, in percent.
    pub quorum_pct: u64,

    /// Share of cast weight that must be "for", in percent.
    pub approval_threshold_pct: u64,

    pub voting_window_secs: u64,

    /// Added to the voting window to compute the advisory execution time.
    pub execution_delay_secs: u64,

    /// Silence after which a participant is considered stale.
    pub liveness_window_secs: u64,

    pub data_dir: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            node_name: "gridgov".to_string(),
            quorum_pct: 30,
            approval_threshold_pct: 60,
            voting_window_secs: 7 * SECONDS_PER_DAY,
            execution_delay_secs: SECONDS_PER_DAY,
            liveness_window_secs: 30 * SECONDS_PER_DAY,
            data_dir: "data".to_string(),
        }
    }
}

impl GovernanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quorum_pct) {
            return Err(GovernanceError::InvalidConfig(format!(
                "quorum_pct must be within 1..=100, got {}",
                self.quorum_pct
            )));
        }
        if !(1..=100).contains(&self.approval_threshold_pct) {
            return Err(GovernanceError::InvalidConfig(format!(
                "approval_threshold_pct must be within 1..=100, got {}",
                self.approval_threshold_pct
            )));
        }
        if self.voting_window_secs == 0 {
            return Err(GovernanceError::InvalidConfig("voting_window_secs must be positive".into()));
        }
        if self.liveness_window_secs == 0 {
            return Err(GovernanceError::InvalidConfig("liveness_window_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads and validates a config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<GovernanceConfig>(&data)?;
        parsed.validate()?;
        Ok(parsed)
    }
}
