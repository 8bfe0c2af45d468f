//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Append a JSONL record of every run to this file
    pub run_log: Option<PathBuf>,
    /// Write diagnostic logs here instead of stderr
    pub file: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// `run_log` with a leading `~` expanded to the home directory.
    pub fn run_log_path(&self) -> Option<PathBuf> {
        self.run_log.as_deref().map(expand_home)
    }

    /// `file` with a leading `~` expanded to the home directory.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_home)
    }
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
