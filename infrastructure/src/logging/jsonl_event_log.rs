//! JSONL file writer for session events.
//!
//! Each [`SessionEvent`] is serialized as a single JSON line carrying its
//! `type` tag, the session code, the topic and a `timestamp`, appended to the
//! file via a buffered writer.

use poker_application::ports::notifier::{EventNotifier, NotifyError};
use poker_domain::{SessionCode, SessionEvent};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL event log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on
/// `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open (or create) the log at `path` for appending.
    ///
    /// Creates parent directories as needed. Returns `None` if the file
    /// cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(session: &SessionCode, event: &SessionEvent) -> Result<String, NotifyError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // The event already serializes as an object tagged with `type`
        let mut record = serde_json::to_value(event)
            .map_err(|e| NotifyError::Delivery(format!("serialize {}: {}", event.name(), e)))?;
        if let serde_json::Value::Object(map) = &mut record {
            map.insert(
                "session_code".to_string(),
                serde_json::Value::String(session.to_string()),
            );
            map.insert(
                "topic".to_string(),
                serde_json::Value::String(event.topic().to_string()),
            );
            map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
        }

        serde_json::to_string(&record)
            .map_err(|e| NotifyError::Delivery(format!("serialize {}: {}", event.name(), e)))
    }
}

impl EventNotifier for JsonlEventLog {
    fn publish(&self, session: &SessionCode, event: &SessionEvent) -> Result<(), NotifyError> {
        let line = Self::record(session, event)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| NotifyError::Closed(self.path.display().to_string()))?;
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| NotifyError::Delivery(format!("{}: {}", self.path.display(), e)))
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
