//! Batch pipeline: read phrases, derive addresses, fetch balances, write records.

pub mod orchestrator;
pub mod reader;
pub mod writer;

pub use orchestrator::BatchOrchestrator;
