//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! implement.

pub mod backend;
pub mod progress;
pub mod run_logger;
