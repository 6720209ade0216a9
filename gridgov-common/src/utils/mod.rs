//! utils.rs
//!
//! Common types and helper implementations shared across gridgov.
//!
//! Participant identities and the clock the engine reads its timestamps from.

pub mod participant_id;
pub use participant_id::ParticipantId;

pub mod time;
