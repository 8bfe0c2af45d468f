//! Progress notification port
//!
//! Defines the interface for reporting progress during an MOA run.

use moa_domain::{AgentId, Phase};

/// Callback for progress updates during an MOA run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain lines, nothing).
pub trait ProgressNotifier: Send + Sync {
    /// Called when a fan-out or aggregation phase of a round starts
    fn on_phase_start(&self, phase: Phase, round: usize, total_tasks: usize);

    /// Called when one agent (or the aggregator) finishes
    fn on_agent_complete(&self, phase: Phase, agent: &AgentId, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: Phase, round: usize);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _round: usize, _total_tasks: usize) {}
    fn on_agent_complete(&self, _phase: Phase, _agent: &AgentId, _success: bool) {}
    fn on_phase_complete(&self, _phase: Phase, _round: usize) {}
}
