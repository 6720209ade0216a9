use std::sync::Arc;

use tracing::{debug, info};

use gridgov_common::{
    config::GovernanceConfig,
    env::events::GovernanceEvent,
    error::Result,
    genesis::GenesisState,
    utils::time::Clock,
};
use gridgov_consensus::{GovernanceEngine, GovernanceEnv};

/// Builds the shared governance environment from config and genesis.
pub fn build_runtime(
    config: GovernanceConfig,
    genesis: &GenesisState,
    clock: Arc<dyn Clock>,
) -> Result<GovernanceEnv> {
    let engine = GovernanceEngine::from_genesis(&config, genesis, clock)?;

    info!(
        node = %config.node_name,
        quorum_pct = config.quorum_pct,
        approval_pct = config.approval_threshold_pct,
        voting_window = config.voting_window_secs,
        "🚀 Governance runtime ready"
    );

    let callback = Arc::new(|event: &GovernanceEvent| {
        debug!("🔔 {}", event.name());
    });
    Ok(GovernanceEnv::with_callback(engine, config, callback))
}
