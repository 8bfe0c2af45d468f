//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent;
pub mod fan_out;
pub mod retry_executor;
pub mod run_moa;
