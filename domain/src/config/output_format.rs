//! Output format value object

use serde::{Deserialize, Serialize};

/// How the result of an MOA run is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Only the final synthesized text (default)
    #[default]
    Text,
    /// Every round's agent outputs, every aggregation, and the final text
    Full,
    /// The full run record as JSON
    Json,
}
