use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Receives the user-facing side effects of a timer expiry. The application
/// layer decides per Settings which of the two fire.
pub trait AlertSink: Send + Sync {
    fn play_sound(&self);
    fn notify(&self, title: &str, body: &str);
}

/// Records alerts as JSON lines under the logs directory. The desktop shell
/// renders the audible and visual alerts; the backend keeps the trace.
#[derive(Debug)]
pub struct LogAlertSink {
    logs_dir: PathBuf,
    guard: Mutex<()>,
}

impl LogAlertSink {
    pub fn new(logs_dir: impl AsRef<Path>) -> Self {
        Self {
            logs_dir: logs_dir.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn append(&self, payload: serde_json::Value) {
        let Ok(_guard) = self.guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("alerts.log");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

impl AlertSink for LogAlertSink {
    fn play_sound(&self) {
        self.append(serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "kind": "sound",
        }));
    }

    fn notify(&self, title: &str, body: &str) {
        self.append(serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "kind": "notification",
            "title": title,
            "body": body,
        }));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    Sound,
    Notification { title: String, body: String },
}

#[derive(Debug, Default)]
pub struct InMemoryAlertSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl InMemoryAlertSink {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AlertSink for InMemoryAlertSink {
    fn play_sound(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.push(AlertEvent::Sound);
        }
    }

    fn notify(&self, title: &str, body: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(AlertEvent::Notification {
                title: title.to_string(),
                body: body.to_string(),
            });
        }
    }
}
