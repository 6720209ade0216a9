pub mod events;
pub mod participant;
pub mod proposal;
pub mod vote_data;

use events::GovernanceEvent;

pub trait Callback: Fn(&GovernanceEvent) + Send + Sync {}
impl<T> Callback for T where T: Fn(&GovernanceEvent) + Send + Sync {}
