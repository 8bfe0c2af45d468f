//! Logging infrastructure: structured run logging.
//!
//! Provides [`JsonlRunLogger`], a JSONL file writer that implements the
//! [`RunLogger`](moa_application::RunLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlRunLogger;
