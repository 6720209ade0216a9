pub mod config;
pub mod env;
pub mod error;
pub mod genesis;
pub mod utils;

pub use error::{GovernanceError, Result};
pub use utils::ParticipantId;
