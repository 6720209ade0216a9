use serde::{Deserialize, Serialize};
use tracing::debug;

use gridgov_common::{
    config::GovernanceConfig,
    error::{GovernanceError, Result},
};

/// Thresholds a proposal must clear to execute.
///
/// All percentage math is integer and truncates toward zero, so results at
/// exact boundaries are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    /// Percent of live total capacity that must have voted.
    pub quorum_pct: u64,
    /// Percent of cast weight that must be "for".
    pub approval_threshold_pct: u64,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { quorum_pct: 30, approval_threshold_pct: 60 }
    }
}

impl From<&GovernanceConfig> for QuorumPolicy {
    fn from(config: &GovernanceConfig) -> Self {
        Self {
            quorum_pct: config.quorum_pct,
            approval_threshold_pct: config.approval_threshold_pct,
        }
    }
}

/// Outcome of applying a [`QuorumPolicy`] to one tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyEvaluation {
    pub cast: u64,
    /// Minimum cast weight for quorum against the live total.
    pub required: u64,
    pub quorum_met: bool,
    pub approval_pct: u64,
    pub approved: bool,
}

impl TallyEvaluation {
    pub fn passes(&self) -> bool {
        self.quorum_met && self.approved
    }
}

impl QuorumPolicy {
    pub fn new(quorum_pct: u64, approval_threshold_pct: u64) -> Self {
        Self { quorum_pct, approval_threshold_pct }
    }

    /// `total * quorum_pct / 100`, truncated.
    pub fn required_quorum(&self, total_active_capacity: u64) -> u64 {
        (total_active_capacity as u128 * self.quorum_pct as u128 / 100) as u64
    }

    /// `votes_for * 100 / cast`, truncated; 0 when nothing was cast.
    pub fn approval_pct(votes_for: u64, cast: u64) -> u64 {
        if cast == 0 {
            return 0;
        }
        (votes_for as u128 * 100 / cast as u128) as u64
    }

    pub fn evaluate(&self, votes_for: u64, votes_against: u64, total_active_capacity: u64) -> TallyEvaluation {
        let cast = votes_for.saturating_add(votes_against);
        let required = self.required_quorum(total_active_capacity);
        let quorum_met = cast >= required;
        let approval_pct = Self::approval_pct(votes_for, cast);
        let approved = approval_pct >= self.approval_threshold_pct;

        debug!(
            cast, required, total_active_capacity, approval_pct,
            "🗳️ Tally evaluated (quorum: {}, approved: {})", quorum_met, approved
        );

        TallyEvaluation { cast, required, quorum_met, approval_pct, approved }
    }

    /// Turns an evaluation into the error a manual `execute` reports.
    pub fn ensure_passes(&self, proposal_id: u64, eval: &TallyEvaluation) -> Result<()> {
        if eval.cast == 0 {
            return Err(GovernanceError::NoVotesCast(proposal_id));
        }
        if !eval.quorum_met {
            return Err(GovernanceError::QuorumNotMet {
                proposal_id,
                cast: eval.cast,
                required: eval.required,
            });
        }
        if !eval.approved {
            return Err(GovernanceError::NotApproved {
                proposal_id,
                approval_pct: eval.approval_pct,
                threshold_pct: self.approval_threshold_pct,
            });
        }
        Ok(())
    }
}
