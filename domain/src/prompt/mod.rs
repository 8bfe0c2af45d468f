//! Prompt templates used by the orchestrator.

pub mod template;

pub use template::PromptTemplate;
