use thiserror::Error;

use crate::utils::ParticipantId;

pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Every way a governance operation can be refused.
///
/// A returned error always means the engine state was left untouched.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid capacity {0}: must be positive")]
    InvalidCapacity(u64),

    #[error("{0} is not an authorized proposer")]
    NotAuthorizedProposer(ParticipantId),

    #[error("{0} is not allowed to perform `{1}`")]
    Unauthorized(ParticipantId, &'static str),

    #[error("Participant {0} is already active")]
    AlreadyActive(ParticipantId),

    #[error("Participant {0} is not active")]
    NotActive(ParticipantId),

    #[error("Participant {voter} already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: u64, voter: ParticipantId },

    #[error("{0} is not an active participant")]
    NotActiveParticipant(ParticipantId),

    #[error("Voting on proposal {0} is closed")]
    VotingClosed(u64),

    #[error("Voting on proposal {0} is still open")]
    VotingStillOpen(u64),

    #[error("Proposal {0} was already executed")]
    AlreadyExecuted(u64),

    #[error("Proposal {0} has no votes cast")]
    NoVotesCast(u64),

    #[error("Proposal {proposal_id}: quorum not met ({cast} cast, {required} required)")]
    QuorumNotMet { proposal_id: u64, cast: u64, required: u64 },

    #[error("Proposal {proposal_id}: approval {approval_pct}% below threshold {threshold_pct}%")]
    NotApproved { proposal_id: u64, approval_pct: u64, threshold_pct: u64 },

    #[error("Proposal {proposal_id}: adding weight {weight} would overflow the tally")]
    TallyOverflow { proposal_id: u64, weight: u64 },

    #[error("No such proposal: {0}")]
    NoSuchProposal(u64),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse grouping of [`GovernanceError`] used by callers to decide whether
/// retrying later can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    Authorization,
    IdentityState,
    Temporal,
    ConsensusNotReached,
    Referential,
    Environment,
}

impl GovernanceError {
    pub fn category(&self) -> ErrorCategory {
        use GovernanceError::*;
        match self {
            EmptyField(_) | InvalidCapacity(_) | InvalidConfig(_) | TallyOverflow { .. } => {
                ErrorCategory::InputValidation
            }
            NotAuthorizedProposer(_) | Unauthorized(..) => ErrorCategory::Authorization,
            AlreadyActive(_) | NotActive(_) | AlreadyVoted { .. } | NotActiveParticipant(_)
            | AlreadyExecuted(_) => ErrorCategory::IdentityState,
            VotingClosed(_) | VotingStillOpen(_) => ErrorCategory::Temporal,
            NoVotesCast(_) | QuorumNotMet { .. } | NotApproved { .. } => {
                ErrorCategory::ConsensusNotReached
            }
            NoSuchProposal(_) => ErrorCategory::Referential,
            Io(_) | Serialization(_) => ErrorCategory::Environment,
        }
    }

    /// True when waiting for more votes (or accepting rejection) is the remedy.
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::ConsensusNotReached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consensus_errors_are_recoverable() {
        let err = GovernanceError::QuorumNotMet { proposal_id: 1, cast: 10, required: 30 };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::ConsensusNotReached);

        let err = GovernanceError::AlreadyVoted { proposal_id: 1, voter: "a".into() };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::IdentityState);
    }

    #[test]
    fn test_display_carries_context() {
        let err = GovernanceError::NotApproved { proposal_id: 3, approval_pct: 59, threshold_pct: 60 };
        assert_eq!(err.to_string(), "Proposal 3: approval 59% below threshold 60%");
    }
}
