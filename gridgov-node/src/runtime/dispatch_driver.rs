use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use gridgov_common::env::{events::GovernanceEvent, proposal::payload_digest};

/// One payload handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub proposal_id: u64,
    pub region: String,
    pub digest: String,
    pub len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub deliveries: Vec<Delivery>,
    /// (proposal_id, votes_for, votes_against)
    pub tallies: Vec<(u64, u64, u64)>,
}

/// Consumes execution notifications and stands in for downstream delivery.
pub struct DispatchDriver;

impl DispatchDriver {
    /// Runs until every sender of the channel is dropped.
    pub fn spawn(mut rx: broadcast::Receiver<GovernanceEvent>) -> JoinHandle<DispatchSummary> {
        tokio::spawn(async move {
            let mut summary = DispatchSummary::default();
            loop {
                match rx.recv().await {
                    Ok(GovernanceEvent::PayloadReady { proposal_id, region, payload }) => {
                        let delivery = Delivery {
                            proposal_id,
                            digest: payload_digest(&payload),
                            len: payload.len(),
                            region,
                        };
                        info!(
                            proposal_id,
                            region = %delivery.region,
                            digest = %delivery.digest,
                            bytes = delivery.len,
                            "📡 Payload dispatched downstream"
                        );
                        summary.deliveries.push(delivery);
                    }
                    Ok(GovernanceEvent::FinalTally { proposal_id, votes_for, votes_against }) => {
                        info!(proposal_id, votes_for, votes_against, "📊 Final tally");
                        summary.tallies.push((proposal_id, votes_for, votes_against));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!("⚠️ Dispatcher lagged, {} events dropped", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            summary
        })
    }
}
