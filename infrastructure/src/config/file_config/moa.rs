//! Orchestration settings from TOML (`[moa]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[moa]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMoaConfig {
    /// Number of fan-out + aggregation rounds
    pub iterations: usize,
    /// Maximum agents running at once (default: number of agents)
    pub max_parallel: Option<usize>,
    /// Per-agent timeout in seconds; `0` disables it
    pub agent_timeout_secs: u64,
}

impl Default for FileMoaConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            max_parallel: None,
            agent_timeout_secs: 120,
        }
    }
}

impl FileMoaConfig {
    pub fn agent_timeout(&self) -> Option<Duration> {
        (self.agent_timeout_secs > 0).then(|| Duration::from_secs(self.agent_timeout_secs))
    }
}
