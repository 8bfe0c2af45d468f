//! Orchestration domain entities

use super::round::RoundResult;
use crate::agent::id::AgentId;
use crate::generation::result::Generation;
use serde::{Deserialize, Serialize};

/// Phase of an MOA run.
///
/// Progress callbacks report `FanOut` and `Aggregation`; errors additionally
/// use `Construction` and `Cancelled` to say where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Building agents and backends from configuration
    Construction,
    /// All agents answer the current round input in parallel
    FanOut,
    /// The aggregator synthesizes the round's answers
    Aggregation,
    /// The caller cancelled the run
    Cancelled,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Construction => "construction",
            Phase::FanOut => "fan_out",
            Phase::Aggregation => "aggregation",
            Phase::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Construction => "Construction",
            Phase::FanOut => "Fan-Out",
            Phase::Aggregation => "Aggregation",
            Phase::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Output of one aggregation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRecord {
    pub round: usize,
    pub aggregator: AgentId,
    pub generation: Generation,
    /// How many agent answers were synthesized
    pub inputs: usize,
}

/// Complete record of a successful MOA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoaRun {
    pub input: String,
    pub final_text: String,
    pub rounds: Vec<RoundResult>,
    pub aggregations: Vec<AggregationRecord>,
}

impl MoaRun {
    /// Total backend attempts across agents and the aggregator.
    pub fn total_attempts(&self) -> u32 {
        let agent_attempts: u32 = self
            .rounds
            .iter()
            .flat_map(|r| r.outcomes())
            .map(|o| o.result.attempts())
            .sum();
        let aggregator_attempts: u32 = self
            .aggregations
            .iter()
            .map(|a| a.generation.attempts)
            .sum();
        agent_attempts + aggregator_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::result::GenerationResult;
    use crate::orchestration::round::AgentOutcome;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::FanOut.to_string(), "Fan-Out");
        assert_eq!(Phase::Aggregation.as_str(), "aggregation");
    }

    #[test]
    fn test_total_attempts() {
        let generation = |attempts| Generation {
            text: "x".to_string(),
            usage: None,
            attempts,
        };
        let run = MoaRun {
            input: "q".to_string(),
            final_text: "x".to_string(),
            rounds: vec![RoundResult::new(
                1,
                vec![
                    AgentOutcome {
                        agent: AgentId::new(0, "a"),
                        result: GenerationResult::Success(generation(2)),
                    },
                    AgentOutcome {
                        agent: AgentId::new(1, "b"),
                        result: GenerationResult::Success(generation(1)),
                    },
                ],
            )],
            aggregations: vec![AggregationRecord {
                round: 1,
                aggregator: AgentId::new(0, "agg"),
                generation: generation(1),
                inputs: 2,
            }],
        };
        assert_eq!(run.total_attempts(), 4);
    }
}
