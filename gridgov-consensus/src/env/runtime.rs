use std::{path::PathBuf, sync::Arc};

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use gridgov_common::{
    config::GovernanceConfig,
    env::{
        events::GovernanceEvent,
        proposal::{Proposal, ProposalStatus},
        Callback,
    },
    error::Result,
    utils::ParticipantId,
};

use super::audit::{save_audit, AuditSnapshot};
use crate::consensus::{GovernanceEngine, VoteReceipt};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Shared handle around a [`GovernanceEngine`].
///
/// All operations go through one mutex, so each runs as a single atomic step
/// no matter how many tasks hold a clone. Events produced by an operation are
/// handed to the callback and the broadcast channel before the lock is released,
/// which keeps subscribers in engine order.
#[derive(Clone)]
pub struct GovernanceEnv {
    engine: Arc<Mutex<GovernanceEngine>>,
    pub config: GovernanceConfig,
    events: broadcast::Sender<GovernanceEvent>,
    callback: Arc<dyn Callback>,
}

impl GovernanceEnv {
    pub fn new(engine: GovernanceEngine, config: GovernanceConfig) -> Self {
        Self::with_callback(engine, config, Arc::new(|_: &GovernanceEvent| {}))
    }

    pub fn with_callback(engine: GovernanceEngine, config: GovernanceConfig, callback: Arc<dyn Callback>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            config,
            events,
            callback,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.events.subscribe()
    }

    /// Runs one engine operation under the lock and publishes what it emitted.
    async fn apply<T>(&self, op: impl FnOnce(&mut GovernanceEngine) -> Result<T>) -> Result<T> {
        let mut engine = self.engine.lock().await;
        let result = op(&mut *engine);
        for event in engine.drain_events() {
            (self.callback)(&event);
            // No subscriber is not an error.
            let _ = self.events.send(event);
        }
        result
    }

    pub async fn register(&self, id: ParticipantId, location: String, capacity: u64) -> Result<u64> {
        self.apply(|e| e.register(id, location, capacity)).await
    }

    pub async fn heartbeat(&self, id: &ParticipantId) -> Result<()> {
        self.apply(|e| e.heartbeat(id)).await
    }

    pub async fn deactivate(&self, caller: &ParticipantId, id: &ParticipantId) -> Result<()> {
        self.apply(|e| e.deactivate(caller, id)).await
    }

    pub async fn check_health(&self, id: &ParticipantId) -> Result<bool> {
        self.apply(|e| e.check_health(id)).await
    }

    pub async fn sweep_health(&self) -> Vec<ParticipantId> {
        self.apply(|e| Ok(e.sweep_health())).await.unwrap_or_default()
    }

    pub async fn propose(
        &self,
        proposer: &ParticipantId,
        command_text: String,
        region: String,
        payload: Vec<u8>,
    ) -> Result<u64> {
        self.apply(|e| e.propose(proposer, command_text, region, payload)).await
    }

    pub async fn vote(&self, voter: &ParticipantId, proposal_id: u64, support: bool) -> Result<VoteReceipt> {
        self.apply(|e| e.vote(voter, proposal_id, support)).await
    }

    pub async fn execute(&self, proposal_id: u64) -> Result<()> {
        self.apply(|e| e.execute(proposal_id)).await
    }

    pub async fn grant_proposer(&self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.apply(|e| e.grant_proposer(caller, id)).await
    }

    pub async fn revoke_proposer(&self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.apply(|e| e.revoke_proposer(caller, id)).await
    }

    pub async fn grant_authority(&self, caller: &ParticipantId, id: ParticipantId) -> Result<bool> {
        self.apply(|e| e.grant_authority(caller, id)).await
    }

    pub async fn revoke_authority(&self, caller: &ParticipantId, id: &ParticipantId) -> Result<bool> {
        self.apply(|e| e.revoke_authority(caller, id)).await
    }

    pub async fn status(&self, proposal_id: u64) -> Result<ProposalStatus> {
        self.engine.lock().await.status(proposal_id)
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.engine.lock().await.proposals().to_vec()
    }

    pub async fn voting_power_of(&self, id: &ParticipantId) -> u64 {
        self.engine.lock().await.voting_power_of(id)
    }

    pub async fn total_active_capacity(&self) -> u64 {
        self.engine.lock().await.total_active_capacity()
    }

    pub async fn snapshot(&self) -> AuditSnapshot {
        let engine = self.engine.lock().await;
        AuditSnapshot::capture(&engine, &self.config.node_name)
    }

    pub fn audit_path(&self) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join(format!("audit-{}.json", self.config.node_name))
    }

    /// Writes a snapshot to `<data_dir>/audit-<node>.json`.
    pub async fn export_audit(&self) -> Option<PathBuf> {
        let path = self.audit_path();
        let audit = self.snapshot().await;
        match save_audit(&path, &audit) {
            Ok(()) => {
                info!("💾 Audit exported to {}", path.display());
                Some(path)
            }
            Err(err) => {
                warn!("Warning: failed to export audit data to {}: {}", path.display(), err);
                None
            }
        }
    }
}
