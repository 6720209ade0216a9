use serde::{Deserialize, Serialize};

use crate::utils::ParticipantId;

/// Why a participant stopped counting toward quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeactivationReason {
    /// Removed by an authority.
    Authority,
    /// Missed the liveness window.
    HealthExpired,
}

/// Notifications emitted by the engine after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ParticipantRegistered {
        participant: ParticipantId,
        capacity: u64,
        voting_power: u64,
        total_active_capacity: u64,
    },
    Heartbeat {
        participant: ParticipantId,
        at: u64,
    },
    ParticipantDeactivated {
        participant: ParticipantId,
        reason: DeactivationReason,
        total_active_capacity: u64,
    },
    ProposalCreated {
        proposal_id: u64,
        proposer: ParticipantId,
        region: String,
        scheduled_execution_time: u64,
    },
    VoteCast {
        proposal_id: u64,
        voter: ParticipantId,
        support: bool,
        weight: u64,
    },
    /// Payload ready for downstream delivery.
    PayloadReady {
        proposal_id: u64,
        region: String,
        #[serde(with = "hex::serde")]
        payload: Vec<u8>,
    },
    FinalTally {
        proposal_id: u64,
        votes_for: u64,
        votes_against: u64,
    },
}

impl GovernanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::ParticipantRegistered { .. } => "REGISTER",
            GovernanceEvent::Heartbeat { .. } => "HEARTBEAT",
            GovernanceEvent::ParticipantDeactivated { .. } => "DEACTIVATE",
            GovernanceEvent::ProposalCreated { .. } => "PROPOSE",
            GovernanceEvent::VoteCast { .. } => "VOTE",
            GovernanceEvent::PayloadReady { .. } => "PAYLOAD_READY",
            GovernanceEvent::FinalTally { .. } => "FINAL_TALLY",
        }
    }
}
