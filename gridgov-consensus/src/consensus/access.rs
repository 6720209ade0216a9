use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gridgov_common::{
    error::{GovernanceError, Result},
    utils::ParticipantId,
};

/// Allow-lists checked at the call boundary of privileged operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    authorities: BTreeSet<ParticipantId>,
    proposers: BTreeSet<ParticipantId>,
}

impl AccessControl {
    /// Seeds both lists with the deploying authority.
    pub fn new(deployer: ParticipantId) -> Self {
        let mut access = Self::default();
        access.authorities.insert(deployer.clone());
        access.proposers.insert(deployer);
        access
    }

    pub fn is_authority(&self, id: &ParticipantId) -> bool {
        self.authorities.contains(id)
    }

    pub fn is_proposer(&self, id: &ParticipantId) -> bool {
        self.proposers.contains(id)
    }

    pub fn ensure_authority(&self, caller: &ParticipantId, action: &'static str) -> Result<()> {
        if self.is_authority(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, action, "⚠️ Unauthorized");
            Err(GovernanceError::Unauthorized(caller.clone(), action))
        }
    }

    pub fn ensure_proposer(&self, caller: &ParticipantId) -> Result<()> {
        if self.is_proposer(caller) {
            Ok(())
        } else {
            warn!(proposer = %caller, "⚠️ Not an authorized proposer");
            Err(GovernanceError::NotAuthorizedProposer(caller.clone()))
        }
    }

    /// Returns false if `id` already was a proposer.
    pub fn grant_proposer(&mut self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.ensure_authority(caller, "grant_proposer")?;
        info!(by = %caller, proposer = %id, "🔑 Proposer granted");
        Ok(self.proposers.insert(id))
    }

    pub fn revoke_proposer(&mut self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.ensure_authority(caller, "revoke_proposer")?;
        info!(by = %caller, proposer = %id, "🔒 Proposer revoked");
        Ok(self.proposers.remove(id))
    }

    pub fn grant_authority(&mut self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.ensure_authority(caller, "grant_authority")?;
        info!(by = %caller, authority = %id, "🔑 Authority granted");
        Ok(self.authorities.insert(id))
    }

    /// Refuses to remove the last authority.
    pub fn revoke_authority(&mut self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.ensure_authority(caller, "revoke_authority")?;
        if self.authorities.len() == 1 && self.authorities.contains(id) {
            warn!(by = %caller, authority = %id, "⚠️ Refusing to revoke the last authority");
            return Err(GovernanceError::Unauthorized(caller.clone(), "revoke_last_authority"));
        }
        Ok(self.authorities.remove(id))
    }

    pub fn authorities(&self) -> impl Iterator<Item = &ParticipantId> {
        self.authorities.iter()
    }

    pub fn proposers(&self) -> impl Iterator<Item = &ParticipantId> {
        self.proposers.iter()
    }
}
