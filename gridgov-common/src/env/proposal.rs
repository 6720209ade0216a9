use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::ParticipantId;

/// A command put to a weighted vote.
///
/// Ids are sequential and start at 1; 0 never names a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,

    /// Human-readable command, stored verbatim.
    pub command_text: String,

    /// Region the command targets, stored verbatim.
    pub region: String,

    /// Opaque signal blob. Re-emitted on execution, never interpreted.
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,

    pub proposer: ParticipantId,

    pub created_at: u64,

    /// created_at + voting window + execution delay. Advisory only.
    pub scheduled_execution_time: u64,

    pub executed: bool,

    #[serde(default)]
    pub executed_at: Option<u64>,

    pub votes_for: u64,
    pub votes_against: u64,
}

impl Proposal {
    pub fn new(
        id: u64,
        command_text: String,
        region: String,
        payload: Vec<u8>,
        proposer: ParticipantId,
        created_at: u64,
        scheduled_execution_time: u64,
    ) -> Self {
        Self {
            id,
            command_text,
            region,
            payload,
            proposer,
            created_at,
            scheduled_execution_time,
            executed: false,
            executed_at: None,
            votes_for: 0,
            votes_against: 0,
        }
    }

    /// Total weight cast so far, for and against. The pool refuses votes that
    /// would push this past `u64::MAX`.
    pub fn cast(&self) -> u64 {
        self.votes_for.saturating_add(self.votes_against)
    }

    /// Last timestamp at which votes are still accepted.
    pub fn voting_deadline(&self, voting_window: u64) -> u64 {
        self.created_at.saturating_add(voting_window)
    }

    pub fn phase(&self, now: u64, voting_window: u64) -> ProposalPhase {
        if self.executed {
            ProposalPhase::Executed
        } else if now > self.voting_deadline(voting_window) {
            ProposalPhase::ClosedUnexecuted
        } else {
            ProposalPhase::Open
        }
    }

    /// Hex SHA-256 of the payload, used to refer to it in logs.
    pub fn payload_digest(&self) -> String {
        payload_digest(&self.payload)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

pub fn payload_digest(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Where a proposal sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalPhase {
    Open,
    ClosedUnexecuted,
    Executed,
}

/// Read-only view returned by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStatus {
    pub command_text: String,
    pub region: String,
    pub votes_for: u64,
    pub votes_against: u64,
    pub total_cast: u64,
    /// Truncated percentage of cast weight that is "for"; 0 with no votes.
    pub approval_pct: u64,
    pub executed: bool,
    /// Quorum met, approval met and not yet executed.
    pub executable: bool,
}
