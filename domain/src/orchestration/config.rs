//! MOA configuration value object.

use crate::agent::config::AgentConfig;
use crate::core::error::ConfigError;
use std::time::Duration;

/// Default per-agent timeout applied when none is configured.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Static configuration of a Mixture-of-Agents orchestrator.
///
/// An MOA with zero agents, zero iterations or zero parallelism cannot be
/// constructed: [`MoaConfigBuilder::build`] rejects it before anything runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MoaConfig {
    iterations: usize,
    agents: Vec<AgentConfig>,
    max_parallel: usize,
    agent_timeout: Option<Duration>,
    aggregator: AgentConfig,
}

impl MoaConfig {
    pub fn builder() -> MoaConfigBuilder {
        MoaConfigBuilder::default()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn agents(&self) -> &[AgentConfig] {
        &self.agents
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Per-agent timeout; `None` means agents are bounded only by their
    /// own retry policy.
    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout
    }

    pub fn aggregator(&self) -> &AgentConfig {
        &self.aggregator
    }
}

/// Builder for [`MoaConfig`].
#[derive(Debug, Clone)]
pub struct MoaConfigBuilder {
    iterations: usize,
    agents: Vec<AgentConfig>,
    max_parallel: Option<usize>,
    agent_timeout: Option<Duration>,
    aggregator: Option<AgentConfig>,
}

impl Default for MoaConfigBuilder {
    fn default() -> Self {
        Self {
            iterations: 1,
            agents: Vec::new(),
            max_parallel: None,
            agent_timeout: Some(DEFAULT_AGENT_TIMEOUT),
            aggregator: None,
        }
    }
}

impl MoaConfigBuilder {
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn agent(mut self, agent: AgentConfig) -> Self {
        self.agents.push(agent);
        self
    }

    #[must_use]
    pub fn agents(mut self, agents: impl IntoIterator<Item = AgentConfig>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Maximum number of agents running at once. Defaults to the agent count.
    #[must_use]
    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel);
        self
    }

    #[must_use]
    pub fn agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    #[must_use]
    pub fn aggregator(mut self, aggregator: AgentConfig) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn build(self) -> Result<MoaConfig, ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::NoAgents);
        }
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        let max_parallel = self.max_parallel.unwrap_or(self.agents.len());
        if max_parallel == 0 {
            return Err(ConfigError::InvalidParallelism(max_parallel));
        }
        if self.agent_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeout("agent_timeout"));
        }
        let aggregator = self.aggregator.ok_or(ConfigError::MissingAggregator)?;

        Ok(MoaConfig {
            iterations: self.iterations,
            agents: self.agents,
            max_parallel,
            agent_timeout: self.agent_timeout,
            aggregator,
        })
    }
}
