use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gridgov_common::{
    config::GovernanceConfig,
    env::{
        events::{DeactivationReason, GovernanceEvent},
        participant::Participant,
        proposal::{Proposal, ProposalPhase, ProposalStatus},
        vote_data::{Vote, VoteData},
    },
    error::{GovernanceError, Result},
    genesis::GenesisState,
    utils::{time::Clock, ParticipantId},
};

use super::{
    access::AccessControl,
    evaluator::{QuorumPolicy, TallyEvaluation},
    pool::ProposalPool,
    registry::ParticipantRegistry,
};

/// What a successful vote did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub weight: u64,
    /// The vote pushed the proposal over both thresholds and it executed.
    pub executed: bool,
}

/// Single owner of the registry, the proposal pool and the allow-lists.
///
/// Every method runs to completion against `&mut self` and validates before it
/// mutates, so a returned error leaves the engine exactly as it was. Events of
/// successful operations are buffered until [`GovernanceEngine::drain_events`].
pub struct GovernanceEngine {
    registry: ParticipantRegistry,
    pool: ProposalPool,
    access: AccessControl,
    policy: QuorumPolicy,
    voting_window: u64,
    execution_delay: u64,
    clock: Arc<dyn Clock>,
    pending_events: Vec<GovernanceEvent>,
}

impl GovernanceEngine {
    pub fn new(config: &GovernanceConfig, deployer: ParticipantId, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: ParticipantRegistry::new(config.liveness_window_secs),
            pool: ProposalPool::new(),
            access: AccessControl::new(deployer),
            policy: QuorumPolicy::from(config),
            voting_window: config.voting_window_secs,
            execution_delay: config.execution_delay_secs,
            clock,
            pending_events: Vec::new(),
        })
    }

    /// Builds an engine whose allow-lists and participants come from genesis.
    pub fn from_genesis(config: &GovernanceConfig, genesis: &GenesisState, clock: Arc<dyn Clock>) -> Result<Self> {
        let deployer = genesis
            .deployer()
            .cloned()
            .ok_or_else(|| GovernanceError::InvalidConfig("genesis needs at least one authority".into()))?;

        let mut engine = Self::new(config, deployer.clone(), clock)?;
        for authority in genesis.authorities.iter().skip(1) {
            engine.access.grant_authority(&deployer, authority.clone())?;
        }
        for proposer in &genesis.proposers {
            engine.access.grant_proposer(&deployer, proposer.clone())?;
        }
        for p in &genesis.participants {
            engine.register(p.id.clone(), p.location.clone(), p.capacity)?;
        }

        info!(
            participants = engine.registry.len(),
            total = engine.registry.total_active_capacity(),
            "🏛️ Genesis applied"
        );
        Ok(engine)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // ---- Registry ---------------------------------------------------------

    pub fn register(&mut self, id: ParticipantId, location: String, capacity: u64) -> Result<u64> {
        let now = self.now();
        let voting_power = self.registry.register(id.clone(), location, capacity, now)?;
        self.emit(GovernanceEvent::ParticipantRegistered {
            participant: id,
            capacity,
            voting_power,
            total_active_capacity: self.registry.total_active_capacity(),
        });
        Ok(voting_power)
    }

    pub fn heartbeat(&mut self, id: &ParticipantId) -> Result<()> {
        let now = self.now();
        self.registry.heartbeat(id, now)?;
        self.emit(GovernanceEvent::Heartbeat { participant: id.clone(), at: now });
        Ok(())
    }

    /// Authority-only removal of a participant from the quorum baseline.
    pub fn deactivate(&mut self, caller: &ParticipantId, id: &ParticipantId) -> Result<()> {
        self.access.ensure_authority(caller, "deactivate")?;
        self.registry.deactivate(id)?;
        self.emit(GovernanceEvent::ParticipantDeactivated {
            participant: id.clone(),
            reason: DeactivationReason::Authority,
            total_active_capacity: self.registry.total_active_capacity(),
        });
        Ok(())
    }

    /// Anyone may call this. Returns whether the participant was expired.
    pub fn check_health(&mut self, id: &ParticipantId) -> Result<bool> {
        let now = self.now();
        let expired = self.registry.check_health(id, now)?;
        if expired {
            self.emit(GovernanceEvent::ParticipantDeactivated {
                participant: id.clone(),
                reason: DeactivationReason::HealthExpired,
                total_active_capacity: self.registry.total_active_capacity(),
            });
        }
        Ok(expired)
    }

    /// Runs `check_health` over every stale participant.
    pub fn sweep_health(&mut self) -> Vec<ParticipantId> {
        let now = self.now();
        let mut expired = Vec::new();
        for id in self.registry.stale_participants(now) {
            match self.check_health(&id) {
                Ok(true) => expired.push(id),
                Ok(false) => {}
                Err(e) => warn!(participant = %id, "⚠️ Health sweep skipped participant: {}", e),
            }
        }
        expired
    }

    pub fn voting_power_of(&self, id: &ParticipantId) -> u64 {
        self.registry.voting_power_of(id)
    }

    pub fn total_active_capacity(&self) -> u64 {
        self.registry.total_active_capacity()
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.registry.get(id)
    }

    pub fn participants(&self) -> Vec<&Participant> {
        self.registry.all()
    }

    // ---- Ledger -----------------------------------------------------------

    pub fn propose(
        &mut self,
        proposer: &ParticipantId,
        command_text: impl Into<String>,
        region: impl Into<String>,
        payload: Vec<u8>,
    ) -> Result<u64> {
        self.access.ensure_proposer(proposer)?;

        let command_text = command_text.into();
        let region = region.into();
        let empty = if command_text.is_empty() {
            Some("command_text")
        } else if region.is_empty() {
            Some("region")
        } else if payload.is_empty() {
            Some("payload")
        } else {
            None
        };
        if let Some(field) = empty {
            warn!(proposer = %proposer, field, "⚠️ Proposal refused: empty field");
            return Err(GovernanceError::EmptyField(field));
        }

        let now = self.now();
        let id = self.pool.next_id();
        let scheduled = now
            .saturating_add(self.voting_window)
            .saturating_add(self.execution_delay);
        let proposal = Proposal::new(id, command_text, region, payload, proposer.clone(), now, scheduled);

        info!(
            proposal_id = id,
            proposer = %proposer,
            payload = %proposal.payload_digest(),
            "📝 Proposal created"
        );
        let region = proposal.region.clone();
        self.pool.add(proposal);

        self.emit(GovernanceEvent::ProposalCreated {
            proposal_id: id,
            proposer: proposer.clone(),
            region,
            scheduled_execution_time: scheduled,
        });
        Ok(id)
    }

    /// Casts `voter`'s full voting power and executes the proposal if both
    /// thresholds now hold.
    pub fn vote(&mut self, voter: &ParticipantId, proposal_id: u64, support: bool) -> Result<VoteReceipt> {
        let now = self.now();
        let proposal = self.pool.get(proposal_id).map_err(|e| {
            warn!(proposal_id, "⚠️ Unknown proposal");
            e
        })?;

        if !self.registry.is_active(voter) {
            warn!(proposal_id, voter = %voter, "⚠️ Vote ignored from inactive participant");
            return Err(GovernanceError::NotActiveParticipant(voter.clone()));
        }
        if proposal.executed || now > proposal.voting_deadline(self.voting_window) {
            warn!(proposal_id, voter = %voter, "⚠️ Vote refused: voting closed");
            return Err(GovernanceError::VotingClosed(proposal_id));
        }
        if self.pool.has_voted(proposal_id, voter) {
            warn!(proposal_id, voter = %voter, "⚠️ Vote refused: already voted");
            return Err(GovernanceError::AlreadyVoted { proposal_id, voter: voter.clone() });
        }

        let weight = self.registry.voting_power_of(voter);
        let vote = Vote::from_support(support);
        if let Err(e) = self.pool.record_vote(proposal_id, voter, vote, weight) {
            warn!(proposal_id, voter = %voter, "⚠️ Vote refused: {}", e);
            return Err(e);
        }
        self.registry.note_vote(voter);

        info!(proposal_id, voter = %voter, weight, "📥 {} voted {}", voter, vote);
        self.emit(GovernanceEvent::VoteCast {
            proposal_id,
            voter: voter.clone(),
            support,
            weight,
        });

        let eval = self.evaluate(proposal_id)?;
        let executed = if eval.passes() {
            info!(proposal_id, approval = eval.approval_pct, "✅ Thresholds met, executing immediately");
            self.apply_execution(proposal_id, now)?;
            true
        } else {
            false
        };

        Ok(VoteReceipt { weight, executed })
    }

    pub fn submit_vote(&mut self, vote: &VoteData) -> Result<VoteReceipt> {
        self.vote(&vote.voter, vote.proposal_id, vote.vote.is_support())
    }

    /// Finalizes a proposal once its voting window has closed.
    pub fn execute(&mut self, proposal_id: u64) -> Result<()> {
        let now = self.now();
        let proposal = self.pool.get(proposal_id).map_err(|e| {
            warn!(proposal_id, "⚠️ Unknown proposal");
            e
        })?;

        if proposal.executed {
            warn!(proposal_id, "⚠️ Execution refused: already executed");
            return Err(GovernanceError::AlreadyExecuted(proposal_id));
        }
        if now < proposal.voting_deadline(self.voting_window) {
            warn!(proposal_id, "⚠️ Execution refused: voting still open");
            return Err(GovernanceError::VotingStillOpen(proposal_id));
        }

        let eval = self.evaluate(proposal_id)?;
        if let Err(e) = self.policy.ensure_passes(proposal_id, &eval) {
            warn!(proposal_id, "❌ Execution refused: {}", e);
            return Err(e);
        }

        self.apply_execution(proposal_id, now)
    }

    /// Pure read; `executable` predicts whether thresholds are met right now.
    pub fn status(&self, proposal_id: u64) -> Result<ProposalStatus> {
        let proposal = self.pool.get(proposal_id)?;
        let eval = self.evaluate(proposal_id)?;

        Ok(ProposalStatus {
            command_text: proposal.command_text.clone(),
            region: proposal.region.clone(),
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
            total_cast: eval.cast,
            approval_pct: eval.approval_pct,
            executed: proposal.executed,
            executable: eval.passes() && !proposal.executed,
        })
    }

    pub fn phase(&self, proposal_id: u64) -> Result<ProposalPhase> {
        let proposal = self.pool.get(proposal_id)?;
        Ok(proposal.phase(self.now(), self.voting_window))
    }

    pub fn proposal(&self, proposal_id: u64) -> Result<&Proposal> {
        self.pool.get(proposal_id)
    }

    pub fn proposals(&self) -> &[Proposal] {
        self.pool.all()
    }

    pub fn proposal_count(&self) -> u64 {
        self.pool.len() as u64
    }

    pub fn has_voted(&self, proposal_id: u64, voter: &ParticipantId) -> bool {
        self.pool.has_voted(proposal_id, voter)
    }

    // ---- Access control ---------------------------------------------------

    pub fn grant_proposer(&mut self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.access.grant_proposer(caller, id)
    }

    pub fn revoke_proposer(&mut self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.access.revoke_proposer(caller, id)
    }

    pub fn grant_authority(&mut self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.access.grant_authority(caller, id)
    }

    /// The last remaining authority cannot be revoked.
    pub fn revoke_authority(&mut self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.access.revoke_authority(caller, id)
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Hands buffered events to the caller, oldest first.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ---- Internals --------------------------------------------------------

    fn evaluate(&self, proposal_id: u64) -> Result<TallyEvaluation> {
        let proposal = self.pool.get(proposal_id)?;
        Ok(self.policy.evaluate(
            proposal.votes_for,
            proposal.votes_against,
            self.registry.total_active_capacity(),
        ))
    }

    /// The execution effect. The executed flag is checked and flipped inside
    /// `mark_executed`, so neither path can apply it twice.
    fn apply_execution(&mut self, proposal_id: u64, now: u64) -> Result<()> {
        let proposal = self.pool.mark_executed(proposal_id, now)?;
        let payload_ready = GovernanceEvent::PayloadReady {
            proposal_id,
            region: proposal.region.clone(),
            payload: proposal.payload.clone(),
        };
        let tally = GovernanceEvent::FinalTally {
            proposal_id,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
        };

        info!(
            proposal_id,
            votes_for = proposal.votes_for,
            votes_against = proposal.votes_against,
            "⚡ Proposal executed"
        );
        self.emit(payload_ready);
        self.emit(tally);
        Ok(())
    }

    fn emit(&mut self, event: GovernanceEvent) {
        tracing::info!(
            target: "governance",
            "EVENT:{} {}",
            event.name(),
            serde_json::to_string(&event).unwrap_or_default()
        );
        self.pending_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridgov_common::utils::time::ManualClock;

    const DAY: u64 = 24 * 60 * 60;

    fn setup() -> (GovernanceEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let config = GovernanceConfig::default();
        let engine = GovernanceEngine::new(&config, "operator".into(), clock.clone()).unwrap();
        (engine, clock)
    }

    fn op() -> ParticipantId {
        ParticipantId::from("operator")
    }

    #[test]
    fn test_single_vote_meeting_both_thresholds_executes() {
        let (mut engine, _) = setup();
        engine.register("a".into(), "north".into(), 40).unwrap();
        engine.register("b".into(), "south".into(), 60).unwrap();
        let id = engine.propose(&op(), "shed load", "north", vec![1, 2, 3]).unwrap();

        let receipt = engine.vote(&"a".into(), id, true).unwrap();
        assert_eq!(receipt, VoteReceipt { weight: 40, executed: true });
        assert!(engine.proposal(id).unwrap().executed);

        let err = engine.vote(&"b".into(), id, false).unwrap_err();
        assert!(matches!(err, GovernanceError::VotingClosed(_)));
        assert_eq!(engine.proposal(id).unwrap().votes_against, 0);
    }

    #[test]
    fn test_execution_emits_payload_then_tally() {
        let (mut engine, _) = setup();
        engine.register("a".into(), "north".into(), 40).unwrap();
        let id = engine.propose(&op(), "shed load", "north", vec![9]).unwrap();
        engine.drain_events();

        engine.vote(&"a".into(), id, true).unwrap();
        let events = engine.drain_events();
        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["VOTE", "PAYLOAD_READY", "FINAL_TALLY"]);
        assert_eq!(
            events[1],
            GovernanceEvent::PayloadReady { proposal_id: id, region: "north".into(), payload: vec![9] }
        );
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_propose_validation() {
        let (mut engine, _) = setup();
        assert!(matches!(
            engine.propose(&"stranger".into(), "cmd", "r", vec![1]),
            Err(GovernanceError::NotAuthorizedProposer(_))
        ));
        assert!(matches!(engine.propose(&op(), "", "r", vec![1]), Err(GovernanceError::EmptyField("command_text"))));
        assert!(matches!(engine.propose(&op(), "cmd", "", vec![1]), Err(GovernanceError::EmptyField("region"))));
        assert!(matches!(engine.propose(&op(), "cmd", "r", vec![]), Err(GovernanceError::EmptyField("payload"))));
        assert_eq!(engine.proposal_count(), 0);

        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();
        assert_eq!(id, 1);
        let p = engine.proposal(id).unwrap();
        assert_eq!(p.created_at, 1_000);
        assert_eq!(p.scheduled_execution_time, 1_000 + 7 * DAY + DAY);
    }

    #[test]
    fn test_vote_rejections_leave_state_untouched() {
        let (mut engine, clock) = setup();
        engine.register("a".into(), "north".into(), 10).unwrap();
        engine.register("b".into(), "south".into(), 90).unwrap();
        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();

        assert!(matches!(engine.vote(&"a".into(), 2, true), Err(GovernanceError::NoSuchProposal(2))));
        assert!(matches!(
            engine.vote(&"ghost".into(), id, true),
            Err(GovernanceError::NotActiveParticipant(_))
        ));

        engine.vote(&"a".into(), id, true).unwrap();
        assert!(matches!(engine.vote(&"a".into(), id, false), Err(GovernanceError::AlreadyVoted { .. })));

        clock.advance(7 * DAY + 1);
        assert!(matches!(engine.vote(&"b".into(), id, true), Err(GovernanceError::VotingClosed(_))));

        let p = engine.proposal(id).unwrap();
        assert_eq!((p.votes_for, p.votes_against), (10, 0));
        assert_eq!(engine.participant(&"a".into()).unwrap().total_votes_cast, 1);
        assert_eq!(engine.participant(&"b".into()).unwrap().total_votes_cast, 0);
    }

    #[test]
    fn test_vote_accepted_exactly_at_deadline() {
        let (mut engine, clock) = setup();
        engine.register("a".into(), "north".into(), 10).unwrap();
        engine.register("b".into(), "south".into(), 90).unwrap();
        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();

        clock.advance(7 * DAY);
        assert_eq!(engine.now(), engine.proposal(id).unwrap().voting_deadline(7 * DAY));
        let receipt = engine.vote(&"a".into(), id, true).unwrap();
        assert!(!receipt.executed);

        clock.advance(1);
        assert!(matches!(engine.vote(&"b".into(), id, true), Err(GovernanceError::VotingClosed(_))));
        assert_eq!(engine.proposal(id).unwrap().votes_for, 10);
    }

    #[test]
    fn test_unknown_proposal_on_execute_and_status() {
        let (mut engine, _) = setup();
        engine.register("a".into(), "north".into(), 10).unwrap();
        engine.propose(&op(), "cmd", "r", vec![1]).unwrap();

        assert!(matches!(engine.execute(0), Err(GovernanceError::NoSuchProposal(0))));
        assert!(matches!(engine.execute(2), Err(GovernanceError::NoSuchProposal(2))));
        assert!(matches!(engine.status(0), Err(GovernanceError::NoSuchProposal(0))));
        assert!(matches!(engine.status(2), Err(GovernanceError::NoSuchProposal(2))));
        assert!(matches!(engine.phase(2), Err(GovernanceError::NoSuchProposal(2))));
    }

    #[test]
    fn test_vote_overflowing_tally_is_refused() {
        let (mut engine, _) = setup();
        let half = 1u64 << 63;
        engine.register("a".into(), "north".into(), half).unwrap();
        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();

        // All against: quorum met, approval 0%, stays open.
        assert!(!engine.vote(&"a".into(), id, false).unwrap().executed);

        engine.deactivate(&op(), &"a".into()).unwrap();
        engine.register("b".into(), "south".into(), half).unwrap();
        engine.drain_events();

        let err = engine.vote(&"b".into(), id, true).unwrap_err();
        assert!(matches!(err, GovernanceError::TallyOverflow { weight, .. } if weight == half));

        let p = engine.proposal(id).unwrap();
        assert_eq!((p.votes_for, p.votes_against), (0, half));
        assert!(!engine.has_voted(id, &"b".into()));
        assert_eq!(engine.participant(&"b".into()).unwrap().total_votes_cast, 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_last_authority_cannot_be_revoked() {
        let (mut engine, _) = setup();
        engine.register("a".into(), "north".into(), 10).unwrap();

        assert!(matches!(
            engine.revoke_authority(&op(), &op()),
            Err(GovernanceError::Unauthorized(_, "revoke_last_authority"))
        ));
        assert!(engine.access().is_authority(&op()));

        engine.grant_authority(&op(), "backup".into()).unwrap();
        assert!(engine.revoke_authority(&"backup".into(), &op()).unwrap());
        assert!(matches!(
            engine.deactivate(&op(), &"a".into()),
            Err(GovernanceError::Unauthorized(_, "deactivate"))
        ));
        engine.deactivate(&"backup".into(), &"a".into()).unwrap();
    }

    #[test]
    fn test_manual_execute_after_window() {
        let (mut engine, clock) = setup();
        engine.register("a".into(), "north".into(), 20).unwrap();
        engine.register("b".into(), "south".into(), 40).unwrap();
        engine.register("c".into(), "east".into(), 40).unwrap();
        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();

        // 20 of 100 cast: below the 30% quorum, nothing executes.
        assert!(!engine.vote(&"a".into(), id, true).unwrap().executed);
        assert!(matches!(engine.execute(id), Err(GovernanceError::VotingStillOpen(_))));

        // b and c go silent; a keeps heartbeating.
        clock.advance(31 * DAY);
        engine.heartbeat(&"a".into()).unwrap();
        assert!(matches!(engine.execute(id), Err(GovernanceError::QuorumNotMet { .. })));

        let expired = engine.sweep_health();
        assert_eq!(expired, vec![ParticipantId::from("b"), ParticipantId::from("c")]);
        assert_eq!(engine.total_active_capacity(), 20);

        assert!(engine.status(id).unwrap().executable);
        engine.execute(id).unwrap();
        assert!(matches!(engine.execute(id), Err(GovernanceError::AlreadyExecuted(_))));
        assert_eq!(engine.phase(id).unwrap(), ProposalPhase::Executed);
    }

    #[test]
    fn test_execute_without_votes() {
        let (mut engine, clock) = setup();
        engine.register("a".into(), "north".into(), 20).unwrap();
        let id = engine.propose(&op(), "cmd", "r", vec![1]).unwrap();
        clock.advance(7 * DAY);
        assert!(matches!(engine.execute(id), Err(GovernanceError::NoVotesCast(_))));
        assert_eq!(engine.phase(id).unwrap(), ProposalPhase::Open);
        clock.advance(1);
        assert_eq!(engine.phase(id).unwrap(), ProposalPhase::ClosedUnexecuted);
    }

    #[test]
    fn test_deactivate_requires_authority() {
        let (mut engine, _) = setup();
        engine.register("a".into(), "north".into(), 20).unwrap();

        assert!(matches!(
            engine.deactivate(&"a".into(), &"a".into()),
            Err(GovernanceError::Unauthorized(_, "deactivate"))
        ));
        assert_eq!(engine.total_active_capacity(), 20);

        engine.deactivate(&op(), &"a".into()).unwrap();
        assert_eq!(engine.total_active_capacity(), 0);
        assert_eq!(engine.voting_power_of(&"a".into()), 0);
    }

    #[test]
    fn test_genesis_seeds_lists_and_participants() {
        let clock = Arc::new(ManualClock::new(0));
        let genesis: GenesisState = serde_json::from_str(
            r#"{
                "authorities": ["root", "backup"],
                "proposers": ["dispatcher"],
                "participants": [
                    { "id": "a", "location": "north", "capacity": 40 },
                    { "id": "b", "location": "south", "capacity": 60 }
                ]
            }"#,
        )
        .unwrap();

        let engine = GovernanceEngine::from_genesis(&GovernanceConfig::default(), &genesis, clock).unwrap();
        assert!(engine.access().is_authority(&"backup".into()));
        assert!(engine.access().is_proposer(&"root".into()));
        assert!(engine.access().is_proposer(&"dispatcher".into()));
        assert_eq!(engine.total_active_capacity(), 100);
    }
}
