//! Offline backend that answers with its own prompt.
//!
//! Lets a configuration be exercised end to end without credentials or
//! network access.

use async_trait::async_trait;
use moa_application::{Backend, BackendError, StreamHandle};
use moa_domain::{Completion, GenerationRequest, StreamEvent, Usage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct EchoBackend {
    name: String,
    model: String,
}

impl EchoBackend {
    pub fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }

    fn reply(&self, request: &GenerationRequest) -> String {
        format!("[{}] {}", self.model, request.prompt())
    }
}

#[async_trait]
impl Backend for EchoBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        let text = self.reply(request);
        let usage = Usage {
            prompt_tokens: request.prompt().split_whitespace().count() as u32,
            completion_tokens: text.split_whitespace().count() as u32,
        };
        Ok(Completion::new(text).with_usage(usage))
    }

    /// Streams the reply one word at a time.
    async fn stream(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<StreamHandle, BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let text = self.reply(request);
        let cancel = cancel.clone();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            for word in text.split_inclusive(' ') {
                if cancel.is_cancelled() {
                    let _ = tx.send(StreamEvent::Error("cancelled".to_string())).await;
                    return;
                }
                if tx.send(StreamEvent::Delta(word.to_string())).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Completed(text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}
