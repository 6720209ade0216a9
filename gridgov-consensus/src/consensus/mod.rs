//! consensus
//!
//! Weighted-capacity voting: a registry of participants whose capacity is their
//! voting weight, a pool of time-bounded proposals, and the evaluator that
//! decides quorum and approval against the live total capacity.
//!
//! Everything here is synchronous and single-writer. Callers that share an
//! engine across tasks go through [`crate::env::runtime::GovernanceEnv`].

pub mod access;
mod engine;
pub mod evaluator;
pub mod pool;
pub mod registry;

pub use engine::{GovernanceEngine, VoteReceipt};
