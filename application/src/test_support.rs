//! Scripted backends shared by the use case tests.

use crate::ports::backend::{Backend, BackendError, BackendFactory};
use async_trait::async_trait;
use moa_domain::{AgentConfig, Completion, GenerationRequest, ProviderKind, RetryPolicy};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared, ordered record of which backend was called with which prompt.
pub type CallLog = Arc<Mutex<Vec<(String, String)>>>;

/// A backend that replays scripted results, then repeats a fallback.
pub struct ScriptedBackend {
    name: String,
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    fallback: Result<String, BackendError>,
    delay: Duration,
    calls: AtomicUsize,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    log: Option<CallLog>,
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedBackend {
    pub fn always(name: &str, text: &str) -> Self {
        Self::new(name, Ok(text.to_string()))
    }

    pub fn failing(name: &str, error: BackendError) -> Self {
        Self::new(name, Err(error))
    }

    fn new(name: &str, fallback: Result<String, BackendError>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Results returned, in order, before falling back.
    pub fn then(self, results: impl IntoIterator<Item = Result<String, BackendError>>) -> Self {
        self.script.lock().unwrap().extend(results);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock()
                .unwrap()
                .push((self.name.clone(), request.prompt().to_string()));
        }

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(self.active.clone());
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
            .map(Completion::new)
    }
}

/// A backend whose every call panics.
pub struct PanickingBackend;

#[async_trait]
impl Backend for PanickingBackend {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> Result<Completion, BackendError> {
        panic!("backend exploded")
    }
}

/// Factory resolving agents to pre-built backends by model name.
#[derive(Default)]
pub struct MockFactory {
    backends: HashMap<String, Arc<dyn Backend>>,
    created: AtomicUsize,
}

impl MockFactory {
    pub fn with(mut self, model: &str, backend: Arc<dyn Backend>) -> Self {
        self.backends.insert(model.to_string(), backend);
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl BackendFactory for MockFactory {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn Backend>, BackendError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.backends
            .get(config.model())
            .cloned()
            .ok_or_else(|| BackendError::InvalidConfig(format!("no backend for {}", config.model())))
    }
}

/// Retry policy with tiny delays so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
        .build()
        .unwrap()
}

/// An echo-provider agent config bound to `model` with a fast retry policy.
pub fn agent_config(model: &str, max_attempts: u32) -> AgentConfig {
    AgentConfig::builder()
        .provider(ProviderKind::Echo)
        .model(model)
        .retry(fast_retry(max_attempts))
        .build()
        .unwrap()
}
