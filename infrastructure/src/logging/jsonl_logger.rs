//! JSONL file writer for run events.
//!
//! Every [`RunEvent`] becomes one JSON line carrying `type`, `timestamp` and
//! the `run_id` of the orchestration that produced it. The file is opened in
//! append mode so successive runs accumulate in the same log.

use moa_application::{RunEvent, RunLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Run logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlRunLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    run_id: String,
}

impl JsonlRunLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened; the caller runs without a
    /// run log in that case.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create run log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open run log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            run_id: new_run_id(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier stamped on every line written by this logger.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn record(&self, event: RunEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut map = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::String(event.event_type.to_string()));
        map.insert("timestamp".to_string(), Value::String(timestamp));
        map.insert("run_id".to_string(), Value::String(self.run_id.clone()));
        Value::Object(map)
    }
}

fn new_run_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%S%3f"),
        std::process::id()
    )
}

impl RunLogger for JsonlRunLogger {
    fn log(&self, event: RunEvent) {
        let Ok(line) = serde_json::to_string(&self.record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlRunLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");
        let logger = JsonlRunLogger::open(&path).unwrap();

        logger.log(RunEvent::new("round_started", json!({ "round": 1, "agents": 3 })));
        logger.log(RunEvent::new(
            "agent_completed",
            json!({ "round": 1, "agent": "echo/alpha", "success": true }),
        ));
        let run_id = logger.run_id().to_string();
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "round_started");
        assert_eq!(lines[0]["agents"], 3);
        assert_eq!(lines[1]["agent"], "echo/alpha");
        for line in &lines {
            assert!(line.get("timestamp").is_some());
            assert_eq!(line["run_id"], run_id.as_str());
        }
    }

    #[test]
    fn test_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");

        let first = JsonlRunLogger::open(&path).unwrap();
        first.log(RunEvent::new("run_completed", json!({})));
        drop(first);

        let second = JsonlRunLogger::open(&path).unwrap();
        second.log(RunEvent::new("run_completed", json!({})));
        drop(second);

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_non_object_payload_goes_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");
        let logger = JsonlRunLogger::open(&path).unwrap();

        logger.log(RunEvent::new("note", json!("just a string")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "note");
        assert_eq!(lines[0]["data"], "just a string");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("runs.jsonl");
        let logger = JsonlRunLogger::open(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
        assert!(path.exists());
    }
}
