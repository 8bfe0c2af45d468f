//! Generation requests, results and streaming events.
//!
//! These are the opaque payloads that flow between the orchestrator and
//! backends: a prompt with parameters goes in, text with usage comes out.

pub mod request;
pub mod result;
pub mod stream;
