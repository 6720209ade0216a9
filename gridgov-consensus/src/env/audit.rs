use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use gridgov_common::{
    env::{participant::Participant, proposal::Proposal},
    error::Result,
    utils::ParticipantId,
};

use crate::consensus::GovernanceEngine;

/// Point-in-time copy of the engine, written out for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSnapshot {
    pub node_name: String,
    pub generated_at: u64,
    pub total_active_capacity: u64,
    pub authorities: Vec<ParticipantId>,
    pub proposers: Vec<ParticipantId>,
    pub participants: Vec<Participant>,
    pub proposals: Vec<Proposal>,
}

impl AuditSnapshot {
    pub fn capture(engine: &GovernanceEngine, node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            generated_at: engine.now(),
            total_active_capacity: engine.total_active_capacity(),
            authorities: engine.access().authorities().cloned().collect(),
            proposers: engine.access().proposers().cloned().collect(),
            participants: engine.participants().into_iter().cloned().collect(),
            proposals: engine.proposals().to_vec(),
        }
    }

    /// Sum of capacity over the active participants in the snapshot.
    pub fn active_capacity_sum(&self) -> u64 {
        self.participants.iter().filter(|p| p.active).map(|p| p.capacity).sum()
    }
}

pub fn save_audit<P: AsRef<Path>>(path: P, audit: &AuditSnapshot) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(audit)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_audit<P: AsRef<Path>>(path: P) -> Result<AuditSnapshot> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
