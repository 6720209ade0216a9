pub mod consensus;
pub mod env;

pub use consensus::access::AccessControl;
pub use consensus::evaluator::{QuorumPolicy, TallyEvaluation};
pub use consensus::registry::ParticipantRegistry;
pub use consensus::{GovernanceEngine, VoteReceipt};
pub use env::runtime::GovernanceEnv;
