//! Result of one fan-out round.

use crate::agent::id::AgentId;
use crate::generation::result::{GenerationFailure, GenerationResult};
use serde::{Deserialize, Serialize};

/// One agent's outcome within a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent: AgentId,
    pub result: GenerationResult,
}

/// All outcomes of one fan-out round, ordered by agent index.
///
/// The order is that of the configured agent list, never completion order.
/// Failed agents are retained together with the reason they failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: usize,
    outcomes: Vec<AgentOutcome>,
}

impl RoundResult {
    /// Build a round result; outcomes are sorted by agent index.
    pub fn new(round: usize, mut outcomes: Vec<AgentOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.agent.index);
        Self { round, outcomes }
    }

    pub fn outcomes(&self) -> &[AgentOutcome] {
        &self.outcomes
    }

    /// Look up the outcome for a specific agent.
    pub fn get(&self, agent_index: usize) -> Option<&AgentOutcome> {
        self.outcomes.iter().find(|o| o.agent.index == agent_index)
    }

    /// Successful outputs as `(agent, text)` pairs, in agent order.
    pub fn successes(&self) -> Vec<(&AgentId, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.text().map(|t| (&o.agent, t)))
            .collect()
    }

    /// Failed agents and why, in agent order.
    pub fn failures(&self) -> Vec<(&AgentId, &GenerationFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.failure().map(|f| (&o.agent, f)))
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// No agent succeeded: nothing for the aggregator to work with.
    pub fn is_total_failure(&self) -> bool {
        self.success_count() == 0
    }
}
