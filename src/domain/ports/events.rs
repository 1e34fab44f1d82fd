//! Event Port
//!
//! Observable interface for builds and unit runs. Enables progress
//! reporting, NDJSON event streams for automation, and silent operation.

use std::path::PathBuf;

use crate::domain::entities::UnitState;
use crate::domain::value_objects::{ContentHash, Stage};

/// Event emitted while building an image
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// Build started
    Started { context: PathBuf, tag: String },

    /// A stage began executing
    StageStarted { stage: Stage, key: ContentHash },

    /// A stage's snapshot was found in the cache
    StageCached { stage: Stage, key: ContentHash },

    /// A stage finished executing
    StageCompleted {
        stage: Stage,
        key: ContentHash,
        detail: Option<String>,
    },

    /// A stage failed; the build stops here
    StageFailed { stage: Stage, error: String },

    /// Non-fatal problem (unknown recipe keys, unresolvable launch target)
    Warning { message: String },

    /// Image published under its tag
    Completed { tag: String, digest: ContentHash },
}

/// Event emitted while running a unit
#[derive(Debug, Clone)]
pub enum UnitEvent {
    /// The unit's state machine moved
    Transition {
        image: String,
        from: UnitState,
        to: UnitState,
    },
}

/// Trait for receiving build and unit events
///
/// Implementations:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait EventSink: Send + Sync {
    fn on_build(&self, event: BuildEvent);

    fn on_unit(&self, event: UnitEvent);

    /// Check if this sink wants per-stage events
    ///
    /// Some sinks may only want summary events.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn on_build(&self, _event: BuildEvent) {}

    fn on_unit(&self, _event: UnitEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
