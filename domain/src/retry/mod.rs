//! Retry policy value object consumed by the Retry Executor.

mod policy;

pub use policy::{RetryPolicy, RetryPolicyBuilder};
