use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gridgov_common::{
    env::proposal::ProposalStatus,
    error::Result,
    utils::{time::ManualClock, ParticipantId},
};
use gridgov_consensus::GovernanceEnv;

/// One caller action in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Register {
        id: ParticipantId,
        #[serde(default)]
        location: String,
        capacity: u64,
    },
    Heartbeat {
        id: ParticipantId,
    },
    Deactivate {
        caller: ParticipantId,
        id: ParticipantId,
    },
    CheckHealth {
        id: ParticipantId,
    },
    Sweep,
    Propose {
        proposer: ParticipantId,
        command_text: String,
        region: String,
        /// Hex-encoded opaque payload.
        #[serde(with = "hex::serde")]
        payload: Vec<u8>,
    },
    Vote {
        voter: ParticipantId,
        proposal_id: u64,
        support: bool,
    },
    Execute {
        proposal_id: u64,
    },
    AdvanceClock {
        secs: u64,
    },
    GrantProposer {
        caller: ParticipantId,
        id: ParticipantId,
    },
    RevokeProposer {
        caller: ParticipantId,
        id: ParticipantId,
    },
    GrantAuthority {
        caller: ParticipantId,
        id: ParticipantId,
    },
    RevokeAuthority {
        caller: ParticipantId,
        id: ParticipantId,
    },
    Status {
        proposal_id: u64,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Register { .. } => "register",
            Operation::Heartbeat { .. } => "heartbeat",
            Operation::Deactivate { .. } => "deactivate",
            Operation::CheckHealth { .. } => "check_health",
            Operation::Sweep => "sweep",
            Operation::Propose { .. } => "propose",
            Operation::Vote { .. } => "vote",
            Operation::Execute { .. } => "execute",
            Operation::AdvanceClock { .. } => "advance_clock",
            Operation::GrantProposer { .. } => "grant_proposer",
            Operation::RevokeProposer { .. } => "revoke_proposer",
            Operation::GrantAuthority { .. } => "grant_authority",
            Operation::RevokeAuthority { .. } => "revoke_authority",
            Operation::Status { .. } => "status",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock value before the first operation.
    #[serde(default)]
    pub start_time: u64,
    pub operations: Vec<Operation>,
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepOutcome>,
    pub statuses: Vec<(u64, ProposalStatus)>,
    pub total_active_capacity: u64,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.ok)
    }
}

/// Replays `scenario` against `env`. Failed operations are recorded and the
/// run continues.
pub async fn run_scenario(env: &GovernanceEnv, clock: &ManualClock, scenario: &Scenario) -> ScenarioReport {
    let mut steps = Vec::with_capacity(scenario.operations.len());

    for (index, op) in scenario.operations.iter().enumerate() {
        let outcome = apply_operation(env, clock, op).await;
        let (ok, detail) = match outcome {
            Ok(detail) => {
                info!(step = index, op = op.name(), "▶️ {}", detail);
                (true, detail)
            }
            Err(e) => {
                warn!(step = index, op = op.name(), "⛔ {}", e);
                (false, e.to_string())
            }
        };
        steps.push(StepOutcome { index, op: op.name(), ok, detail });
    }

    let mut statuses = Vec::new();
    for proposal in env.proposals().await {
        if let Ok(status) = env.status(proposal.id).await {
            statuses.push((proposal.id, status));
        }
    }

    ScenarioReport {
        steps,
        statuses,
        total_active_capacity: env.total_active_capacity().await,
    }
}

async fn apply_operation(env: &GovernanceEnv, clock: &ManualClock, op: &Operation) -> Result<String> {
    let detail = match op {
        Operation::Register { id, location, capacity } => {
            let power = env.register(id.clone(), location.clone(), *capacity).await?;
            format!("{} registered with voting power {}", id, power)
        }
        Operation::Heartbeat { id } => {
            env.heartbeat(id).await?;
            format!("{} heartbeat", id)
        }
        Operation::Deactivate { caller, id } => {
            env.deactivate(caller, id).await?;
            format!("{} deactivated by {}", id, caller)
        }
        Operation::CheckHealth { id } => {
            if env.check_health(id).await? {
                format!("{} expired", id)
            } else {
                format!("{} healthy", id)
            }
        }
        Operation::Sweep => {
            let expired = env.sweep_health().await;
            format!("{} participants expired", expired.len())
        }
        Operation::Propose { proposer, command_text, region, payload } => {
            let id = env
                .propose(proposer, command_text.clone(), region.clone(), payload.clone())
                .await?;
            format!("proposal {} created", id)
        }
        Operation::Vote { voter, proposal_id, support } => {
            let receipt = env.vote(voter, *proposal_id, *support).await?;
            format!(
                "{} cast {} on proposal {}{}",
                voter,
                receipt.weight,
                proposal_id,
                if receipt.executed { " (executed)" } else { "" }
            )
        }
        Operation::Execute { proposal_id } => {
            env.execute(*proposal_id).await?;
            format!("proposal {} executed", proposal_id)
        }
        Operation::AdvanceClock { secs } => {
            let now = clock.advance(*secs);
            format!("clock at {}", now)
        }
        Operation::GrantProposer { caller, id } => {
            env.grant_proposer(caller, id.clone()).await?;
            format!("{} may propose", id)
        }
        Operation::RevokeProposer { caller, id } => {
            env.revoke_proposer(caller, id).await?;
            format!("{} may no longer propose", id)
        }
        Operation::GrantAuthority { caller, id } => {
            env.grant_authority(caller, id.clone()).await?;
            format!("{} is an authority", id)
        }
        Operation::RevokeAuthority { caller, id } => {
            env.revoke_authority(caller, id).await?;
            format!("{} is no longer an authority", id)
        }
        Operation::Status { proposal_id } => {
            let s = env.status(*proposal_id).await?;
            format!(
                "proposal {}: for={} against={} approval={}% executed={} executable={}",
                proposal_id, s.votes_for, s.votes_against, s.approval_pct, s.executed, s.executable
            )
        }
    };
    Ok(detail)
}
