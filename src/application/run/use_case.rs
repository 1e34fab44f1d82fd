//! Run Use Case
//!
//! Loads a tagged image, resolves its launch directive inside the image
//! rootfs and drives one `RunnableUnit` through its lifecycle:
//! CREATED -> STARTING -> RUNNING -> EXITED(code) | CRASHED.
//!
//! There is no restart logic and no timeout.

use std::fmt;
use std::sync::Arc;

use crate::domain::entities::{RunnableUnit, UnitState};
use crate::domain::ports::{
    ChildProcess, EventSink, FileSystem, ImageStore, LaunchPlan, NoopEventSink, ProcessRunner,
    StoredImage, Termination, UnitEvent,
};
use crate::domain::services::{compose_env, map_into_rootfs, resolve_target};
use crate::domain::value_objects::ImageTag;
use crate::error::{BerthError, BerthResult};

/// Options for the run use case
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tag: ImageTag,
    /// Supervisor environment, passed through to the child
    pub host_env: Vec<(String, String)>,
}

impl RunOptions {
    /// Run `tag` with the current process environment.
    pub fn new(tag: ImageTag) -> Self {
        Self {
            tag,
            host_env: std::env::vars().collect(),
        }
    }

    pub fn with_host_env(mut self, env: Vec<(String, String)>) -> Self {
        self.host_env = env;
        self
    }
}

/// A unit that reached a terminal state through its process.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub unit: RunnableUnit,
    pub termination: Termination,
    /// Code `berth run` exits with
    pub exit_code: i32,
}

/// A unit that crashed before its process could be started or waited on.
#[derive(Debug)]
pub struct RunFailure {
    pub unit: RunnableUnit,
    pub error: BerthError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit '{}' crashed: {}", self.unit.image(), self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct RunUseCase<IS, PR, FS>
where
    IS: ImageStore,
    PR: ProcessRunner,
    FS: FileSystem,
{
    images: IS,
    runner: PR,
    fs: FS,
}

impl<IS, PR, FS> RunUseCase<IS, PR, FS>
where
    IS: ImageStore,
    PR: ProcessRunner,
    FS: FileSystem,
{
    pub fn new(images: IS, runner: PR, fs: FS) -> Self {
        Self { images, runner, fs }
    }

    pub fn execute(&self, options: &RunOptions) -> Result<RunOutcome, RunFailure> {
        self.execute_with_events(options, Arc::new(NoopEventSink))
    }

    pub fn execute_with_events(
        &self,
        options: &RunOptions,
        sink: Arc<dyn EventSink>,
    ) -> Result<RunOutcome, RunFailure> {
        let sink = sink.as_ref();
        let _span = tracing::info_span!("unit", image = %options.tag).entered();
        let mut unit = RunnableUnit::new(options.tag.as_str());

        let image = match self.images.load(&options.tag) {
            Ok(image) => image,
            Err(error) => return Err(RunFailure { unit, error }),
        };

        if let Err(error) = advance(&mut unit, UnitState::Starting, sink) {
            return Err(RunFailure { unit, error });
        }

        let spawned = self
            .plan(&image, &options.host_env)
            .and_then(|plan| self.runner.spawn(&plan));
        let mut child = match spawned {
            Ok(child) => child,
            Err(error) => return Err(crash(unit, error, sink)),
        };

        let pid = child.id();
        if let Err(error) = advance(&mut unit, UnitState::Running { pid }, sink) {
            return Err(RunFailure { unit, error });
        }
        tracing::info!(pid, "unit running");

        let termination = match child.wait() {
            Ok(termination) => termination,
            Err(error) => return Err(crash(unit, error, sink)),
        };

        let (next, signal) = match termination {
            Termination::Exited(code) => (UnitState::Exited { code }, None),
            Termination::Signaled(signal) => (
                UnitState::Crashed {
                    reason: match signal {
                        Some(sig) => format!("killed by signal {}", sig),
                        None => "killed by a signal".to_string(),
                    },
                },
                signal,
            ),
        };
        if let Err(error) = advance(&mut unit, next, sink) {
            return Err(RunFailure { unit, error });
        }

        let exit_code = unit.exit_code(signal).unwrap_or(1);
        tracing::info!(exit_code, state = %unit.state(), "unit finished");
        Ok(RunOutcome {
            unit,
            termination,
            exit_code,
        })
    }

    /// Resolve the directive against the image rootfs.
    fn plan(&self, image: &StoredImage, host_env: &[(String, String)]) -> BerthResult<LaunchPlan> {
        let metadata = &image.metadata;
        let program = resolve_target(&self.fs, &image.rootfs, &metadata.launch, &metadata.path)?;
        let cwd = map_into_rootfs(&image.rootfs, metadata.launch.workdir());
        let env = compose_env(
            host_env.iter().cloned(),
            &metadata.env,
            &metadata.path,
            &image.rootfs,
        );

        Ok(LaunchPlan {
            program,
            arg0: metadata.launch.program().to_string(),
            args: metadata.launch.args().to_vec(),
            cwd,
            env,
        })
    }
}

fn advance(unit: &mut RunnableUnit, next: UnitState, sink: &dyn EventSink) -> BerthResult<()> {
    let from = unit.state().clone();
    unit.transition(next)?;
    tracing::debug!(from = %from, to = %unit.state(), "unit transition");
    sink.on_unit(UnitEvent::Transition {
        image: unit.image().to_string(),
        from,
        to: unit.state().clone(),
    });
    Ok(())
}

fn crash(mut unit: RunnableUnit, error: BerthError, sink: &dyn EventSink) -> RunFailure {
    tracing::error!(error = %error, "unit crashed");
    let reason = error.to_string();
    if let Err(transition) = advance(&mut unit, UnitState::Crashed { reason }, sink) {
        tracing::warn!(error = %transition, "could not record crash");
    }
    RunFailure { unit, error }
}
