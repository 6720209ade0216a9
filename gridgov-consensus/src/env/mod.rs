pub mod audit;
pub mod runtime;
