//! Structured configuration issues.
//!
//! Raw configuration (TOML files, CLI flags) is checked up front and every
//! problem is reported as a [`ConfigIssue`] with a severity, so callers can
//! print all of them at once instead of failing on the first.
//!
//! # Examples
//!
//! ```
//! use moa_domain::core::validation::{ConfigIssue, ConfigIssueCode, Severity};
//!
//! let issues = vec![ConfigIssue::warning(
//!     ConfigIssueCode::UnusedField { field: "agents[0].tools".to_string() },
//!     "tools are ignored by the echo provider",
//! )];
//! assert!(!ConfigIssue::has_errors(&issues));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// No `[[agents]]` entries were configured.
    NoAgents,
    /// No `[aggregator]` was configured.
    MissingAggregator,
    /// A model name is empty.
    EmptyModelName { field: String },
    /// A provider name does not match any known provider.
    UnknownProvider { field: String, value: String },
    /// A numeric field is out of its allowed range.
    OutOfRange { field: String },
    /// A field is set but has no effect for this configuration.
    UnusedField { field: String },
    /// A provider needs credentials and none are configured.
    MissingCredentials { provider: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Check whether any issues are errors (i.e. fatal).
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}
