//! Agent configuration and identity.

pub mod config;
pub mod id;
