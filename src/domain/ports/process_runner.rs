//! Process runner port
//!
//! Starts exactly one process, without a shell, and waits for it.

use std::path::PathBuf;

use crate::error::BerthResult;

/// Everything needed to exec the launch directive on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Resolved host path of the program
    pub program: PathBuf,
    /// argv[0] as written in the directive
    pub arg0: String,
    /// Literal arguments (argv[1..])
    pub args: Vec<String>,
    /// Host path of the image workdir
    pub cwd: PathBuf,
    /// Complete environment of the child
    pub env: Vec<(String, String)>,
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Killed by a signal (number when the platform reports one)
    Signaled(Option<i32>),
}

pub trait ChildProcess {
    fn id(&self) -> u32;

    /// Block until the process ends. No timeout.
    fn wait(&mut self) -> BerthResult<Termination>;
}

pub trait ProcessRunner {
    type Child: ChildProcess;

    /// Spawn the plan with inherited stdio.
    fn spawn(&self, plan: &LaunchPlan) -> BerthResult<Self::Child>;
}
