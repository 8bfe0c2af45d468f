//! Run MOA use case
//!
//! Drives the Mixture-of-Agents loop: for each iteration, fan the current
//! input out to every agent, then have the aggregator synthesize the
//! survivors' answers into the next input. The last aggregation is the final
//! answer.

use crate::ports::backend::{BackendError, BackendFactory};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use crate::use_cases::agent::Agent;
use crate::use_cases::fan_out::{FanOutError, FanOutScheduler, agent_ids, panic_message};
use crate::use_cases::retry_executor::ExecutionError;
use moa_domain::core::string::{single_line, truncate};
use moa_domain::{
    AggregationRecord, ConfigError, GenerationResult, MoaConfig, MoaRun, Phase, PromptTemplate,
    RoundResult,
};
use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bytes of agent output kept in `agent_completed` run events.
const LOG_PREVIEW_LEN: usize = 120;

/// Errors surfaced to the caller of an MOA run.
///
/// Every variant maps to the [`Phase`] in which the run stopped.
#[derive(Error, Debug)]
pub enum MoaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot create backend for agent '{agent}': {source}")]
    Backend { agent: String, source: BackendError },

    #[error("Round {round} failed: none of {agents} agent(s) produced a response")]
    RoundFailed {
        round: usize,
        agents: usize,
        result: Box<RoundResult>,
    },

    #[error("Aggregation failed in round {round}: {source}")]
    AggregationFailed {
        round: usize,
        source: ExecutionError,
    },

    #[error("Cancelled during {during} (round {round})")]
    Cancelled { during: Phase, round: usize },
}

impl MoaError {
    /// The phase in which the run stopped.
    pub fn phase(&self) -> Phase {
        match self {
            MoaError::Config(_) | MoaError::Backend { .. } => Phase::Construction,
            MoaError::RoundFailed { .. } => Phase::FanOut,
            MoaError::AggregationFailed { .. } => Phase::Aggregation,
            MoaError::Cancelled { .. } => Phase::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MoaError::Cancelled { .. })
    }
}

/// The MOA orchestrator.
///
/// Holds only immutable configuration and shared backends; `generate` takes
/// `&self`, so one orchestrator can serve concurrent runs.
pub struct MoaOrchestrator {
    agents: Vec<Agent>,
    aggregator: Agent,
    iterations: usize,
    scheduler: FanOutScheduler,
    run_logger: Arc<dyn RunLogger>,
}

impl MoaOrchestrator {
    /// Bind every configured agent and the aggregator to a backend.
    ///
    /// All backends are created up front, so a misconfigured agent fails here
    /// rather than in the middle of a run.
    pub fn new(config: MoaConfig, factory: &dyn BackendFactory) -> Result<Self, MoaError> {
        let mut agents = Vec::with_capacity(config.agents().len());
        for (index, agent_config) in config.agents().iter().enumerate() {
            let backend = factory
                .create(agent_config)
                .map_err(|source| MoaError::Backend {
                    agent: agent_config.label(),
                    source,
                })?;
            agents.push(Agent::new(index, agent_config.clone(), backend));
        }

        let aggregator_config = config.aggregator();
        let backend = factory
            .create(aggregator_config)
            .map_err(|source| MoaError::Backend {
                agent: aggregator_config.label(),
                source,
            })?;
        let aggregator = Agent::new(agents.len(), aggregator_config.clone(), backend);

        info!(
            "MOA ready: {} agent(s), aggregator {}, {} iteration(s)",
            agents.len(),
            aggregator.id(),
            config.iterations()
        );

        Ok(Self {
            agents,
            aggregator,
            iterations: config.iterations(),
            scheduler: FanOutScheduler::new(config.max_parallel(), config.agent_timeout()),
            run_logger: Arc::new(NoRunLogger),
        })
    }

    /// Attach a structured run logger.
    pub fn with_run_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.run_logger = logger;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn aggregator(&self) -> &Agent {
        &self.aggregator
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run the full loop and return the final synthesized text.
    pub async fn generate(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<String, MoaError> {
        self.generate_detailed(input, cancel, &NoProgress)
            .await
            .map(|run| run.final_text)
    }

    /// Run the full loop and return every round and aggregation.
    pub async fn generate_detailed(
        &self,
        input: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<MoaRun, MoaError> {
        let result = self.run(input, cancel, progress).await;
        if let Err(e) = &result {
            warn!("MOA run failed: {}", e);
            self.run_logger.log(RunEvent::new(
                "run_failed",
                json!({
                    "phase": e.phase().as_str(),
                    "error": e.to_string(),
                }),
            ));
        }
        result
    }

    async fn run(
        &self,
        input: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<MoaRun, MoaError> {
        let mut round_input = input.to_string();
        let mut rounds = Vec::with_capacity(self.iterations);
        let mut aggregations = Vec::with_capacity(self.iterations);

        for round in 1..=self.iterations {
            if cancel.is_cancelled() {
                return Err(MoaError::Cancelled {
                    during: Phase::FanOut,
                    round,
                });
            }

            self.run_logger.log(RunEvent::new(
                "round_started",
                json!({
                    "round": round,
                    "agents": agent_ids(&self.agents),
                    "input_chars": round_input.chars().count(),
                }),
            ));

            let result = match self
                .scheduler
                .run_round(round, &round_input, &self.agents, cancel, progress)
                .await
            {
                Ok(result) => result,
                Err(FanOutError::Cancelled { round }) => {
                    return Err(MoaError::Cancelled {
                        during: Phase::FanOut,
                        round,
                    });
                }
                Err(FanOutError::NoSurvivors(result)) => {
                    self.log_round(&result);
                    return Err(MoaError::RoundFailed {
                        round,
                        agents: result.len(),
                        result,
                    });
                }
            };
            self.log_round(&result);

            let record = self
                .aggregate(round, input, &round_input, &result, cancel, progress)
                .await?;
            round_input = record.generation.text.clone();
            rounds.push(result);
            aggregations.push(record);
        }

        info!("MOA run complete after {} round(s)", rounds.len());
        Ok(MoaRun {
            input: input.to_string(),
            final_text: round_input,
            rounds,
            aggregations,
        })
    }

    async fn aggregate(
        &self,
        round: usize,
        original_input: &str,
        round_input: &str,
        result: &RoundResult,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<AggregationRecord, MoaError> {
        info!(
            "Round {}: aggregating {} response(s) with {}",
            round,
            result.success_count(),
            self.aggregator.id()
        );
        progress.on_phase_start(Phase::Aggregation, round, 1);

        let responses: Vec<(String, String)> = result
            .successes()
            .into_iter()
            .map(|(id, text)| (id.label.clone(), text.to_string()))
            .collect();
        let prompt = PromptTemplate::aggregation_prompt(
            original_input,
            round_input,
            &responses,
            result.failure_count(),
        );

        let mut request = self.aggregator.config().request_for(prompt);
        if request.system_prompt().is_none() {
            request = request.with_system_prompt(PromptTemplate::aggregation_system());
        }

        let attempts = AtomicU32::new(0);
        let call = self
            .aggregator
            .generate_request_counted(&request, cancel, &attempts);
        let outcome = AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ExecutionError::Crashed {
                    attempts: attempts.load(Ordering::SeqCst),
                    message: panic_message(&*panic).to_string(),
                })
            });
        progress.on_agent_complete(Phase::Aggregation, self.aggregator.id(), outcome.is_ok());
        progress.on_phase_complete(Phase::Aggregation, round);

        match outcome {
            Ok(generation) => {
                self.run_logger.log(RunEvent::new(
                    "aggregation_completed",
                    json!({
                        "round": round,
                        "aggregator": self.aggregator.id(),
                        "inputs": responses.len(),
                        "attempts": generation.attempts,
                        "output_chars": generation.text.chars().count(),
                    }),
                ));
                Ok(AggregationRecord {
                    round,
                    aggregator: self.aggregator.id().clone(),
                    generation,
                    inputs: responses.len(),
                })
            }
            Err(e) if e.is_cancelled() => Err(MoaError::Cancelled {
                during: Phase::Aggregation,
                round,
            }),
            Err(source) => Err(MoaError::AggregationFailed { round, source }),
        }
    }

    fn log_round(&self, result: &RoundResult) {
        for outcome in result.outcomes() {
            let mut payload = json!({
                "round": result.round,
                "agent": outcome.agent,
                "success": outcome.result.is_success(),
                "attempts": outcome.result.attempts(),
            });
            match &outcome.result {
                GenerationResult::Success(generation) => {
                    payload["preview"] =
                        json!(truncate(&single_line(&generation.text), LOG_PREVIEW_LEN));
                }
                GenerationResult::Failure(failure) => {
                    payload["failure"] = json!({
                        "kind": failure.kind,
                        "message": failure.message,
                    });
                }
            }
            self.run_logger.log(RunEvent::new("agent_completed", payload));
        }

        self.run_logger.log(RunEvent::new(
            "round_completed",
            json!({
                "round": result.round,
                "succeeded": result.success_count(),
                "failed": result.failure_count(),
            }),
        ));
    }
}
