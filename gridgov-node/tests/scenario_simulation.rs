use std::sync::Arc;

use gridgov_common::{
    config::GovernanceConfig,
    env::proposal::payload_digest,
    genesis::{GenesisParticipant, GenesisState},
    utils::{time::ManualClock, ParticipantId},
};
use gridgov_node::{
    build_runtime,
    runtime::{
        dispatch_driver::DispatchDriver,
        script::{run_scenario, Scenario},
    },
};

const DAY: u64 = 24 * 60 * 60;

fn genesis() -> GenesisState {
    let mut genesis = GenesisState::new(ParticipantId::from("operator"));
    genesis.participants = vec![
        GenesisParticipant { id: "A".into(), location: "north".into(), capacity: 40 },
        GenesisParticipant { id: "B".into(), location: "south".into(), capacity: 60 },
    ];
    genesis
}

fn scenario(json: &str) -> Scenario {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn test_scenario_dispatches_executed_payload() {
    let scenario = scenario(
        r#"{
            "start_time": 1000,
            "operations": [
                { "op": "propose", "proposer": "operator", "command_text": "shed load", "region": "north", "payload": "0102" },
                { "op": "vote", "voter": "B", "proposal_id": 1, "support": true },
                { "op": "status", "proposal_id": 1 }
            ]
        }"#,
    );
    let clock = Arc::new(ManualClock::new(scenario.start_time));
    let env = build_runtime(GovernanceConfig::default(), &genesis(), clock.clone()).unwrap();
    let dispatcher = DispatchDriver::spawn(env.subscribe());

    let report = run_scenario(&env, &clock, &scenario).await;
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.total_active_capacity, 100);
    assert_eq!(report.statuses.len(), 1);
    assert!(report.statuses[0].1.executed);

    drop(env);
    let summary = dispatcher.await.unwrap();
    assert_eq!(summary.deliveries.len(), 1);
    assert_eq!(summary.deliveries[0].region, "north");
    assert_eq!(summary.deliveries[0].digest, payload_digest(&[1, 2]));
    assert_eq!(summary.tallies, vec![(1, 60, 0)]);
}

#[tokio::test]
async fn test_rejected_steps_do_not_abort_the_run() {
    let scenario = scenario(&format!(
        r#"{{
            "operations": [
                {{ "op": "propose", "proposer": "A", "command_text": "cmd", "region": "r", "payload": "00" }},
                {{ "op": "grant_proposer", "caller": "operator", "id": "A" }},
                {{ "op": "propose", "proposer": "A", "command_text": "cmd", "region": "r", "payload": "00" }},
                {{ "op": "vote", "voter": "ghost", "proposal_id": 1, "support": true }},
                {{ "op": "execute", "proposal_id": 1 }},
                {{ "op": "advance_clock", "secs": {} }},
                {{ "op": "sweep" }}
            ]
        }}"#,
        31 * DAY
    ));
    let clock = Arc::new(ManualClock::new(scenario.start_time));
    let env = build_runtime(GovernanceConfig::default(), &genesis(), clock.clone()).unwrap();

    let report = run_scenario(&env, &clock, &scenario).await;
    let ok: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
    assert_eq!(ok, vec![false, true, true, false, false, true, true]);
    assert_eq!(report.steps[6].detail, "2 participants expired");
    assert_eq!(report.total_active_capacity, 0);
    assert!(!report.statuses[0].1.executed);
}

#[tokio::test]
async fn test_authority_handover_keeps_one_authority() {
    let scenario = scenario(
        r#"{
            "operations": [
                { "op": "revoke_authority", "caller": "operator", "id": "operator" },
                { "op": "grant_authority", "caller": "operator", "id": "backup" },
                { "op": "revoke_authority", "caller": "backup", "id": "operator" },
                { "op": "deactivate", "caller": "operator", "id": "A" },
                { "op": "deactivate", "caller": "backup", "id": "A" },
                { "op": "revoke_authority", "caller": "backup", "id": "backup" }
            ]
        }"#,
    );
    let clock = Arc::new(ManualClock::new(scenario.start_time));
    let env = build_runtime(GovernanceConfig::default(), &genesis(), clock.clone()).unwrap();

    let report = run_scenario(&env, &clock, &scenario).await;
    let ok: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
    assert_eq!(ok, vec![false, true, true, false, true, false]);
    assert_eq!(report.total_active_capacity, 60);
    assert_eq!(env.snapshot().await.authorities, vec![ParticipantId::from("backup")]);
}
