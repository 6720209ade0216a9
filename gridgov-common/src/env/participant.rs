use serde::{Deserialize, Serialize};

use crate::utils::ParticipantId;

/// A registered capacity holder.
///
/// Records are never removed: a deactivated participant stays in the registry
/// for audit and may come back through a fresh registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,

    /// Free-form description of where the capacity lives.
    pub location: String,

    /// Registered capacity, in whatever unit the host uses (e.g. MW).
    pub capacity: u64,

    pub active: bool,

    /// Timestamp of the last registration or heartbeat.
    pub last_health_time: u64,

    /// Weight applied to this participant's votes. Equal to `capacity` today.
    pub voting_power: u64,

    /// Diagnostic counter, survives reactivation.
    #[serde(default)]
    pub total_votes_cast: u64,
}

impl Participant {
    pub fn new(id: ParticipantId, location: String, capacity: u64, now: u64) -> Self {
        Self {
            id,
            location,
            capacity,
            active: true,
            last_health_time: now,
            voting_power: capacity,
            total_votes_cast: 0,
        }
    }

    /// Seconds elapsed since the last heartbeat.
    pub fn silence(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_health_time)
    }

    pub fn is_stale(&self, now: u64, liveness_window: u64) -> bool {
        self.silence(now) > liveness_window
    }
}
