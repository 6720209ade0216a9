use std::collections::HashMap;

use tracing::{info, warn};

use gridgov_common::{
    env::participant::Participant,
    error::{GovernanceError, Result},
    utils::ParticipantId,
};

/// Authoritative record of participants and their capacity.
///
/// `total_active_capacity` is kept in step with every activation flip, so
/// reading it is O(1) on the voting path.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
    total_active_capacity: u64,
    liveness_window: u64,
}

impl ParticipantRegistry {
    pub fn new(liveness_window: u64) -> Self {
        Self {
            participants: HashMap::new(),
            total_active_capacity: 0,
            liveness_window,
        }
    }

    pub fn liveness_window(&self) -> u64 {
        self.liveness_window
    }

    /// Registers (or re-registers a deactivated) participant and returns its
    /// voting power.
    pub fn register(
        &mut self,
        id: ParticipantId,
        location: String,
        capacity: u64,
        now: u64,
    ) -> Result<u64> {
        let previous = self.participants.get(&id);
        if previous.map_or(false, |p| p.active) {
            warn!(participant = %id, "⚠️ Registration refused: participant already active");
            return Err(GovernanceError::AlreadyActive(id));
        }

        if capacity == 0 {
            warn!(participant = %id, "⚠️ Registration refused: zero capacity");
            return Err(GovernanceError::InvalidCapacity(capacity));
        }

        let new_total = self
            .total_active_capacity
            .checked_add(capacity)
            .ok_or(GovernanceError::InvalidCapacity(capacity))?;

        let mut record = Participant::new(id.clone(), location, capacity, now);
        if let Some(old) = previous {
            record.total_votes_cast = old.total_votes_cast;
            info!(participant = %id, "♻️ Reactivating participant");
        }

        let voting_power = record.voting_power;
        self.participants.insert(id.clone(), record);
        self.total_active_capacity = new_total;

        info!(
            participant = %id,
            capacity,
            total = self.total_active_capacity,
            "📥 Participant registered"
        );
        Ok(voting_power)
    }

    pub fn heartbeat(&mut self, id: &ParticipantId, now: u64) -> Result<()> {
        let participant = self.active_mut(id)?;
        participant.last_health_time = now;
        Ok(())
    }

    /// Deactivates an active participant and returns the capacity removed.
    pub fn deactivate(&mut self, id: &ParticipantId) -> Result<u64> {
        let participant = self.active_mut(id)?;
        participant.active = false;
        let capacity = participant.capacity;

        self.total_active_capacity -= capacity;
        info!(
            participant = %id,
            capacity,
            total = self.total_active_capacity,
            "🔌 Participant deactivated"
        );
        Ok(capacity)
    }

    /// Deactivates the participant if it has been silent longer than the
    /// liveness window. Returns whether it was deactivated.
    pub fn check_health(&mut self, id: &ParticipantId, now: u64) -> Result<bool> {
        let window = self.liveness_window;
        let participant = self.active_mut(id)?;

        if !participant.is_stale(now, window) {
            return Ok(false);
        }

        warn!(
            participant = %id,
            silence = participant.silence(now),
            window,
            "⏰ Participant missed its liveness window"
        );
        self.deactivate(id)?;
        Ok(true)
    }

    /// Active participants whose last heartbeat is older than the window,
    /// sorted by id.
    pub fn stale_participants(&self, now: u64) -> Vec<ParticipantId> {
        let mut stale: Vec<ParticipantId> = self
            .participants
            .values()
            .filter(|p| p.active && p.is_stale(now, self.liveness_window))
            .map(|p| p.id.clone())
            .collect();
        stale.sort();
        stale
    }

    /// 0 for unknown or inactive identities.
    pub fn voting_power_of(&self, id: &ParticipantId) -> u64 {
        self.participants
            .get(id)
            .filter(|p| p.active)
            .map(|p| p.voting_power)
            .unwrap_or(0)
    }

    pub fn total_active_capacity(&self) -> u64 {
        self.total_active_capacity
    }

    pub fn is_active(&self, id: &ParticipantId) -> bool {
        self.participants.get(id).map_or(false, |p| p.active)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Every record, active or not, sorted by id.
    pub fn all(&self) -> Vec<&Participant> {
        let mut all: Vec<&Participant> = self.participants.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Bumps the diagnostic vote counter. Capacity state is not touched.
    pub fn note_vote(&mut self, id: &ParticipantId) {
        if let Some(p) = self.participants.get_mut(id) {
            p.total_votes_cast += 1;
        }
    }

    /// Sum of capacity over active participants, computed by scanning.
    /// Only for audits; the hot path reads `total_active_capacity`.
    pub fn recomputed_total(&self) -> u64 {
        self.participants
            .values()
            .filter(|p| p.active)
            .map(|p| p.capacity)
            .sum()
    }

    fn active_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant> {
        match self.participants.get_mut(id) {
            Some(p) if p.active => Ok(p),
            _ => {
                warn!(participant = %id, "⚠️ Participant is not active");
                Err(GovernanceError::NotActive(id.clone()))
            }
        }
    }
}
