pub mod cli;
pub mod runtime;
pub mod setup;

pub use runtime::builder::build_runtime;
