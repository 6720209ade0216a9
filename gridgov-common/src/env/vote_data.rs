use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::ParticipantId;

/// Direction of a weighted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    For,
    Against,
}

impl Vote {
    pub fn from_support(support: bool) -> Self {
        if support { Vote::For } else { Vote::Against }
    }

    pub fn is_support(&self) -> bool {
        matches!(self, Vote::For)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vote::For => "For",
            Vote::Against => "Against",
        };
        write!(f, "{}", s)
    }
}

/// A vote as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteData {
    pub proposal_id: u64,
    pub voter: ParticipantId,
    pub vote: Vote,
}

impl VoteData {
    pub fn new(proposal_id: u64, voter: ParticipantId, support: bool) -> Self {
        Self {
            proposal_id,
            voter,
            vote: Vote::from_support(support),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
