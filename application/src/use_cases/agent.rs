//! Agent: a configured backend bound through its own Retry Executor.

use crate::ports::backend::Backend;
use crate::use_cases::retry_executor::{ExecutionError, RetryExecutor};
use moa_domain::{AgentConfig, AgentId, Generation, GenerationRequest};
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use tokio_util::sync::CancellationToken;

/// One independently configured participant of a fan-out round.
///
/// Cloning is cheap and clones share nothing mutable: the configuration is
/// immutable and the backend is only ever called through `&self`.
#[derive(Clone)]
pub struct Agent {
    id: AgentId,
    config: Arc<AgentConfig>,
    backend: Arc<dyn Backend>,
    executor: RetryExecutor,
}

impl Agent {
    pub fn new(index: usize, config: AgentConfig, backend: Arc<dyn Backend>) -> Self {
        let id = AgentId::new(index, config.label());
        let executor = RetryExecutor::new(config.retry().clone());
        Self {
            id,
            config: Arc::new(config),
            backend,
            executor,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Generate a response to `prompt` using this agent's parameters.
    pub async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Generation, ExecutionError> {
        let request = self.config.request_for(prompt);
        self.generate_request(&request, cancel).await
    }

    /// Generate from a fully built request.
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Generation, ExecutionError> {
        self.executor
            .execute(self.backend.as_ref(), request, cancel)
            .await
    }

    pub(crate) async fn generate_counted(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<Generation, ExecutionError> {
        let request = self.config.request_for(prompt);
        self.generate_request_counted(&request, cancel, attempts)
            .await
    }

    pub(crate) async fn generate_request_counted(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<Generation, ExecutionError> {
        self.executor
            .execute_counted(self.backend.as_ref(), request, cancel, attempts)
            .await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, agent_config};

    #[tokio::test]
    async fn test_agent_uses_config_label_and_params() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let backend = Arc::new(ScriptedBackend::always("m", "hello").with_log(log.clone()));
        let agent = Agent::new(2, agent_config("m", 1), backend);

        assert_eq!(agent.id().index, 2);
        assert_eq!(agent.id().label, "echo/m");

        let generation = agent
            .generate("What is Rust?", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(generation.text, "hello");
        assert_eq!(log.lock().unwrap()[0].1, "What is Rust?");
    }

    #[tokio::test]
    async fn test_clones_share_no_retry_state() {
        let backend = Arc::new(ScriptedBackend::always("m", "ok"));
        let agent = Agent::new(0, agent_config("m", 3), backend.clone());
        let other = agent.clone();
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(agent.generate("a", &cancel), other.generate("b", &cancel));
        assert_eq!(a.unwrap().attempts, 1);
        assert_eq!(b.unwrap().attempts, 1);
        assert_eq!(backend.calls(), 2);
    }
}
