use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::utils::ParticipantId;

/// A participant registered when the engine starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisParticipant {
    pub id: ParticipantId,
    #[serde(default)]
    pub location: String,
    pub capacity: u64,
}

/// Initial allow-lists and participants of a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisState {
    /// The first entry is the deploying authority.
    pub authorities: Vec<ParticipantId>,

    #[serde(default)]
    pub proposers: Vec<ParticipantId>,

    #[serde(default)]
    pub participants: Vec<GenesisParticipant>,
}

impl GenesisState {
    pub fn new(deployer: ParticipantId) -> Self {
        Self {
            authorities: vec![deployer],
            proposers: Vec::new(),
            participants: Vec::new(),
        }
    }

    pub fn deployer(&self) -> Option<&ParticipantId> {
        self.authorities.first()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let genesis: GenesisState = serde_json::from_str(&data)?;
        if genesis.authorities.is_empty() {
            return Err(GovernanceError::InvalidConfig("genesis needs at least one authority".into()));
        }
        Ok(genesis)
    }
}
