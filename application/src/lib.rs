//! Application layer for moa
//!
//! This crate contains the port definitions and the concurrent core of the
//! Mixture-of-Agents orchestrator: the Retry Executor, the Agent, the
//! Fan-Out Scheduler and the iteration loop. It depends only on the domain
//! layer.

pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use ports::{
    backend::{Backend, BackendError, BackendFactory, EndpointOverride, ErrorClass, StreamHandle},
    progress::{NoProgress, ProgressNotifier},
    run_logger::{NoRunLogger, RunEvent, RunLogger},
};
pub use use_cases::agent::Agent;
pub use use_cases::fan_out::{FanOutError, FanOutScheduler};
pub use use_cases::retry_executor::{ExecutionError, RetryExecutor};
pub use use_cases::run_moa::{MoaError, MoaOrchestrator};
