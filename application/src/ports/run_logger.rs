//! Port for structured run logging.
//!
//! Defines the [`RunLogger`] trait for recording orchestration events
//! (round boundaries, per-agent outcomes, aggregations, failures) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record of each run (JSONL).

use serde_json::Value;

/// A structured run event for logging.
pub struct RunEvent {
    /// Event type identifier (e.g., "round_started", "agent_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging run events.
///
/// `log` is synchronous and infallible so logging never disrupts a run;
/// implementations swallow their own I/O errors.
pub trait RunLogger: Send + Sync {
    fn log(&self, event: RunEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoRunLogger;

impl RunLogger for NoRunLogger {
    fn log(&self, _event: RunEvent) {}
}
