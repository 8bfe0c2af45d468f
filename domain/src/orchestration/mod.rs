//! Mixture-of-Agents orchestration model.
//!
//! - [`config::MoaConfig`] - validated, immutable orchestrator configuration
//! - [`round::RoundResult`] - per-agent outcomes of one fan-out round
//! - [`entities::MoaRun`] - full record of a run (rounds + aggregations)
//! - [`entities::Phase`] - which part of a run is active or failed

pub mod config;
pub mod entities;
pub mod round;
