use std::collections::{HashMap, HashSet};

use gridgov_common::{
    env::{proposal::Proposal, vote_data::Vote},
    error::{GovernanceError, Result},
    utils::ParticipantId,
};

/// In-memory store of proposals and of who voted on each.
///
/// Proposal `n` lives at index `n - 1`; ids are never reused.
#[derive(Debug, Default, Clone)]
pub struct ProposalPool {
    proposals: Vec<Proposal>,
    // ProposalID -> voters
    voted: HashMap<u64, HashSet<ParticipantId>>,
}

impl ProposalPool {
    pub fn new() -> Self {
        Self {
            proposals: Vec::new(),
            voted: HashMap::new(),
        }
    }

    /// Id the next proposal will receive.
    pub fn next_id(&self) -> u64 {
        self.proposals.len() as u64 + 1
    }

    /// Appends a proposal. Its id must be [`Self::next_id`].
    pub(crate) fn add(&mut self, proposal: Proposal) {
        debug_assert_eq!(proposal.id, self.next_id());
        self.voted.entry(proposal.id).or_default();
        self.proposals.push(proposal);
    }

    pub fn get(&self, id: u64) -> Result<&Proposal> {
        index_of(id)
            .and_then(|i| self.proposals.get(i))
            .ok_or(GovernanceError::NoSuchProposal(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Proposal> {
        index_of(id)
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or(GovernanceError::NoSuchProposal(id))
    }

    pub fn has_voted(&self, id: u64, voter: &ParticipantId) -> bool {
        self.voted.get(&id).map_or(false, |voters| voters.contains(voter))
    }

    /// Records `voter`'s weight on one side of the tally.
    pub(crate) fn record_vote(&mut self, id: u64, voter: &ParticipantId, vote: Vote, weight: u64) -> Result<()> {
        if self.has_voted(id, voter) {
            return Err(GovernanceError::AlreadyVoted { proposal_id: id, voter: voter.clone() });
        }

        let proposal = self.get_mut(id)?;
        // for + against must stay representable, so `cast()` never clamps.
        proposal
            .votes_for
            .checked_add(proposal.votes_against)
            .and_then(|cast| cast.checked_add(weight))
            .ok_or(GovernanceError::TallyOverflow { proposal_id: id, weight })?;
        match vote {
            Vote::For => proposal.votes_for += weight,
            Vote::Against => proposal.votes_against += weight,
        }
        self.voted.entry(id).or_default().insert(voter.clone());
        Ok(())
    }

    /// Flips `executed` exactly once. Both execution paths go through here.
    pub(crate) fn mark_executed(&mut self, id: u64, now: u64) -> Result<&Proposal> {
        let proposal = self.get_mut(id)?;
        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        proposal.executed = true;
        proposal.executed_at = Some(now);
        Ok(proposal)
    }

    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn voters(&self, id: u64) -> Option<&HashSet<ParticipantId>> {
        self.voted.get(&id)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

fn index_of(id: u64) -> Option<usize> {
    id.checked_sub(1).map(|i| i as usize)
}
