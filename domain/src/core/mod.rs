//! Core domain concepts shared across all subdomains.
//!
//! - [`provider::ProviderKind`] — backend families an agent can be bound to
//! - [`error::ConfigError`] — construction-time configuration errors
//! - [`validation::ConfigIssue`] — structured issues found in raw configuration

pub mod error;
pub mod provider;
pub mod string;
pub mod validation;
