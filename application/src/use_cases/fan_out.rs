//! Fan-Out Scheduler
//!
//! Runs every agent of a round against the same input on a bounded pool of
//! slots. Each agent gets its own child cancellation token and timeout, so a
//! stuck agent neither blocks nor cancels its siblings. Outcomes are keyed by
//! [`AgentId`], never by completion order.

use crate::ports::progress::ProgressNotifier;
use crate::use_cases::agent::Agent;
use futures::FutureExt;
use moa_domain::{
    AgentId, AgentOutcome, FailureKind, GenerationFailure, GenerationResult, Phase, RoundResult,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// A round that produced nothing usable.
#[derive(Error, Debug)]
pub enum FanOutError {
    /// Every agent failed; the round result says why.
    #[error("round {}: all {} agent(s) failed", .0.round, .0.len())]
    NoSurvivors(Box<RoundResult>),

    #[error("round {round} cancelled")]
    Cancelled { round: usize },
}

/// Bounded-parallel executor for one fan-out round.
#[derive(Debug, Clone)]
pub struct FanOutScheduler {
    max_parallel: usize,
    agent_timeout: Option<Duration>,
}

impl FanOutScheduler {
    /// `max_parallel` is clamped to at least one slot.
    pub fn new(max_parallel: usize, agent_timeout: Option<Duration>) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            agent_timeout,
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout
    }

    /// Run `input` against every agent and collect one outcome per agent.
    ///
    /// Succeeds when at least one agent succeeded. Returns only after every
    /// spawned worker has finished, including after cancellation.
    pub async fn run_round(
        &self,
        round: usize,
        input: &str,
        agents: &[Agent],
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<RoundResult, FanOutError> {
        info!(
            "Round {}: fanning out to {} agent(s), max {} in parallel",
            round,
            agents.len(),
            self.max_parallel
        );
        progress.on_phase_start(Phase::FanOut, round, agents.len());

        let slots = Arc::new(Semaphore::new(self.max_parallel));
        let input: Arc<str> = Arc::from(input);
        let mut join_set = JoinSet::new();

        for agent in agents {
            let agent = agent.clone();
            let slots = Arc::clone(&slots);
            let input = Arc::clone(&input);
            let agent_cancel = cancel.child_token();
            let timeout = self.agent_timeout;
            let span = info_span!("agent", agent = %agent.id(), round);

            join_set.spawn(
                async move {
                    let id = agent.id().clone();
                    let worker = Self::run_agent(agent, input, slots, agent_cancel, timeout);
                    let result = AssertUnwindSafe(worker)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            crashed(format!("agent panicked: {}", panic_message(&*panic)))
                        });
                    AgentOutcome { agent: id, result }
                }
                .instrument(span),
            );
        }

        let mut outcomes: Vec<AgentOutcome> = Vec::with_capacity(agents.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    match &outcome.result {
                        GenerationResult::Success(g) => {
                            debug!("{} answered in {} attempt(s)", outcome.agent, g.attempts)
                        }
                        GenerationResult::Failure(f) => {
                            warn!("{} failed ({}): {}", outcome.agent, f.kind, f.message)
                        }
                    }
                    progress.on_agent_complete(
                        Phase::FanOut,
                        &outcome.agent,
                        outcome.result.is_success(),
                    );
                    outcomes.push(outcome);
                }
                Err(e) => warn!("Agent worker did not complete: {}", e),
            }
        }

        // A worker that was aborted leaves no outcome; record it explicitly.
        for agent in agents {
            if !outcomes.iter().any(|o| o.agent == *agent.id()) {
                outcomes.push(AgentOutcome {
                    agent: agent.id().clone(),
                    result: crashed("agent worker aborted".to_string()),
                });
            }
        }

        progress.on_phase_complete(Phase::FanOut, round);
        let result = RoundResult::new(round, outcomes);

        if cancel.is_cancelled() {
            info!("Round {} cancelled", round);
            return Err(FanOutError::Cancelled { round });
        }

        info!(
            "Round {}: {}/{} agent(s) succeeded",
            round,
            result.success_count(),
            result.len()
        );

        if result.is_total_failure() {
            return Err(FanOutError::NoSurvivors(Box::new(result)));
        }
        Ok(result)
    }

    async fn run_agent(
        agent: Agent,
        input: Arc<str>,
        slots: Arc<Semaphore>,
        cancel: CancellationToken,
        timeout: Option<Duration>,
    ) -> GenerationResult {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return failure(FailureKind::Cancelled, "cancelled while queued", 0);
            }
            permit = slots.acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return crashed("slot pool closed".to_string()),
            },
        };

        let attempts = AtomicU32::new(0);
        let call = agent.generate_counted(&input, &cancel, &attempts);

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    cancel.cancel();
                    return failure(
                        FailureKind::TimedOut,
                        format!("no response within {:?}", limit),
                        attempts.load(Ordering::SeqCst),
                    );
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(generation) => GenerationResult::Success(generation),
            Err(e) => failure(e.failure_kind(), e.to_string(), e.attempts()),
        }
    }
}

fn failure(kind: FailureKind, message: impl Into<String>, attempts: u32) -> GenerationResult {
    GenerationResult::Failure(GenerationFailure::new(kind, message, attempts))
}

fn crashed(message: String) -> GenerationResult {
    failure(FailureKind::Crashed, message, 0)
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Agent ids in configuration order; used when reporting a failed round.
pub(crate) fn agent_ids(agents: &[Agent]) -> Vec<AgentId> {
    agents.iter().map(|a| a.id().clone()).collect()
}
