//! Runnable unit entity
//!
//! One execution of an image. The unit owns a small state machine:
//!
//! ```text
//! CREATED -> STARTING -> RUNNING -> EXITED(code)
//!                 \            \
//!                  -> CRASHED   -> CRASHED
//! ```
//!
//! Every transition is recorded; anything off the graph is rejected.

use std::fmt;

use crate::error::{BerthError, BerthResult};

/// Lifecycle state of a runnable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Created,
    Starting,
    Running { pid: u32 },
    Exited { code: i32 },
    Crashed { reason: String },
}

impl UnitState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Starting => "STARTING",
            Self::Running { .. } => "RUNNING",
            Self::Exited { .. } => "EXITED",
            Self::Crashed { .. } => "CRASHED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exited { .. } | Self::Crashed { .. })
    }

    /// Whether the state machine allows `self -> next`.
    pub fn can_transition_to(&self, next: &UnitState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Starting)
                | (Self::Starting, Self::Running { .. })
                | (Self::Starting, Self::Crashed { .. })
                | (Self::Running { .. }, Self::Exited { .. })
                | (Self::Running { .. }, Self::Crashed { .. })
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "EXITED({})", code),
            other => f.write_str(other.name()),
        }
    }
}

/// A single execution of a tagged image.
#[derive(Debug, Clone)]
pub struct RunnableUnit {
    image: String,
    state: UnitState,
    history: Vec<UnitState>,
}

impl RunnableUnit {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            state: UnitState::Created,
            history: vec![UnitState::Created],
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    /// Every state the unit has been in, oldest first.
    pub fn history(&self) -> &[UnitState] {
        &self.history
    }

    pub fn transition(&mut self, next: UnitState) -> BerthResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(BerthError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(next.clone());
        self.state = next;
        Ok(())
    }

    /// Exit code for the supervisor once the unit is terminal.
    ///
    /// A crash maps to `signal + 128` when a signal is known, otherwise 1.
    pub fn exit_code(&self, signal: Option<i32>) -> Option<i32> {
        match &self.state {
            UnitState::Exited { code } => Some(*code),
            UnitState::Crashed { .. } => Some(signal.map(|s| 128 + s).unwrap_or(1)),
            _ => None,
        }
    }
}
