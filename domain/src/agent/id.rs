//! Agent identity within one MOA configuration.

use serde::{Deserialize, Serialize};

/// Stable identity of an agent: its position in the configured agent list
/// plus a display label.
///
/// Round results are keyed by `AgentId`, so the association between an
/// agent and its output never depends on completion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId {
    pub index: usize,
    pub label: String,
}

impl AgentId {
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.label, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AgentId::new(2, "openai/gpt-4o").to_string(), "openai/gpt-4o#2");
    }

    #[test]
    fn test_ordering_is_by_index_first() {
        let mut ids = vec![AgentId::new(1, "a"), AgentId::new(0, "z")];
        ids.sort();
        assert_eq!(ids[0].index, 0);
    }
}
