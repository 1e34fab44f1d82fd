//! JSON Event Sink
//!
//! Outputs build and unit events as NDJSON for CI/automation consumption.

use crate::domain::entities::UnitState;
use crate::domain::ports::{BuildEvent, EventSink, UnitEvent};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Write to stderr, leaving stdout to the launched process
    pub fn stderr() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Create a JSON event sink writing to a custom writer (for testing)
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

fn state_json(state: &UnitState) -> serde_json::Value {
    match state {
        UnitState::Running { pid } => serde_json::json!({ "state": state.name(), "pid": pid }),
        UnitState::Exited { code } => serde_json::json!({ "state": state.name(), "code": code }),
        UnitState::Crashed { reason } => {
            serde_json::json!({ "state": state.name(), "reason": reason })
        }
        _ => serde_json::json!({ "state": state.name() }),
    }
}

impl EventSink for JsonEventSink {
    fn on_build(&self, event: BuildEvent) {
        let json = match event {
            BuildEvent::Started { context, tag } => {
                serde_json::json!({
                    "event": "start",
                    "command": "build",
                    "context": context.display().to_string(),
                    "tag": tag,
                })
            }

            BuildEvent::StageStarted { stage, key } => {
                serde_json::json!({
                    "event": "stage_start",
                    "command": "build",
                    "stage": stage.as_str(),
                    "key": key.as_str(),
                })
            }

            BuildEvent::StageCached { stage, key } => {
                serde_json::json!({
                    "event": "stage_cached",
                    "command": "build",
                    "stage": stage.as_str(),
                    "key": key.as_str(),
                })
            }

            BuildEvent::StageCompleted { stage, key, detail } => {
                serde_json::json!({
                    "event": "stage_complete",
                    "command": "build",
                    "stage": stage.as_str(),
                    "key": key.as_str(),
                    "detail": detail,
                })
            }

            BuildEvent::StageFailed { stage, error } => {
                serde_json::json!({
                    "event": "stage_failed",
                    "command": "build",
                    "stage": stage.as_str(),
                    "error": error,
                })
            }

            BuildEvent::Warning { message } => {
                serde_json::json!({
                    "event": "warning",
                    "command": "build",
                    "message": message,
                })
            }

            BuildEvent::Completed { tag, digest } => {
                serde_json::json!({
                    "event": "complete",
                    "command": "build",
                    "status": "success",
                    "tag": tag,
                    "digest": digest.as_str(),
                })
            }
        };

        self.write_event(json);
    }

    fn on_unit(&self, event: UnitEvent) {
        let json = match event {
            UnitEvent::Transition { image, from, to } => {
                serde_json::json!({
                    "event": "transition",
                    "command": "run",
                    "image": image,
                    "from": from.name(),
                    "to": state_json(&to),
                })
            }
        };

        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
