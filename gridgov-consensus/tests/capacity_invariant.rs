use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use gridgov_common::{
    config::GovernanceConfig,
    utils::{time::ManualClock, ParticipantId},
};
use gridgov_consensus::GovernanceEngine;

const DAY: u64 = 24 * 60 * 60;

fn assert_aggregate_consistent(engine: &GovernanceEngine) {
    let expected: u64 = engine
        .participants()
        .iter()
        .filter(|p| p.active)
        .map(|p| p.capacity)
        .sum();
    assert_eq!(engine.total_active_capacity(), expected);
    assert_eq!(engine.registry().recomputed_total(), expected);
}

#[test]
fn test_aggregate_matches_active_capacity_under_random_mutations() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let clock = Arc::new(ManualClock::new(0));
        let mut engine =
            GovernanceEngine::new(&GovernanceConfig::default(), "operator".into(), clock.clone()).unwrap();
        let operator = ParticipantId::from("operator");
        let ids: Vec<ParticipantId> = (0..12).map(|i| ParticipantId::from(format!("node-{i}"))).collect();

        for _ in 0..400 {
            let target = &ids[rng.gen_range(0..ids.len())];
            match rng.gen_range(0..5) {
                0 => {
                    let capacity = rng.gen_range(0..500);
                    let _ = engine.register(target.clone(), "site".into(), capacity);
                }
                1 => {
                    let _ = engine.deactivate(&operator, target);
                }
                2 => {
                    let _ = engine.check_health(target);
                }
                3 => {
                    let _ = engine.heartbeat(target);
                }
                _ => {
                    clock.advance(rng.gen_range(0..10 * DAY));
                }
            }
            assert_aggregate_consistent(&engine);
        }
    }
}

#[test]
fn test_each_voter_counted_once_per_proposal() {
    let mut rng = StdRng::seed_from_u64(42);
    let clock = Arc::new(ManualClock::new(0));
    let mut config = GovernanceConfig::default();
    // Thresholds that a random tally rarely crosses, so most proposals stay open.
    config.quorum_pct = 100;
    config.approval_threshold_pct = 100;
    let mut engine = GovernanceEngine::new(&config, "operator".into(), clock).unwrap();
    let operator = ParticipantId::from("operator");

    let ids: Vec<ParticipantId> = (0..6).map(|i| ParticipantId::from(format!("v{i}"))).collect();
    for (i, id) in ids.iter().enumerate() {
        engine.register(id.clone(), "site".into(), (i as u64 + 1) * 10).unwrap();
    }
    let proposals: Vec<u64> = (0..4)
        .map(|_| engine.propose(&operator, "cmd", "r", vec![1]).unwrap())
        .collect();

    for _ in 0..200 {
        let voter = &ids[rng.gen_range(0..ids.len())];
        let pid = proposals[rng.gen_range(0..proposals.len())];
        let _ = engine.vote(voter, pid, rng.gen_bool(0.5));
    }

    for &pid in &proposals {
        let proposal = engine.proposal(pid).unwrap();
        let voted_weight: u64 = ids
            .iter()
            .filter(|id| engine.has_voted(pid, id))
            .map(|id| engine.voting_power_of(id))
            .sum();
        assert_eq!(proposal.cast(), voted_weight);
    }

    let total_votes: u64 = engine.participants().iter().map(|p| p.total_votes_cast).sum();
    let recorded: u64 = proposals
        .iter()
        .map(|&pid| ids.iter().filter(|id| engine.has_voted(pid, id)).count() as u64)
        .sum();
    assert_eq!(total_votes, recorded);
}
