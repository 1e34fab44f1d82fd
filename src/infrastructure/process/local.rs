//! Local process runner
//!
//! Execs the plan directly (no shell) with inherited stdio and a fully
//! specified environment.

use std::process::{Child, Command, ExitStatus, Stdio};

use crate::domain::ports::{ChildProcess, LaunchPlan, ProcessRunner, Termination};
use crate::error::BerthResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcessRunner;

impl LocalProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// A spawned host process
#[derive(Debug)]
pub struct LocalChild {
    child: Child,
}

impl ProcessRunner for LocalProcessRunner {
    type Child = LocalChild;

    fn spawn(&self, plan: &LaunchPlan) -> BerthResult<LocalChild> {
        let mut command = Command::new(&plan.program);
        set_arg0(&mut command, &plan.arg0);
        command
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .env_clear()
            .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        tracing::debug!(program = %plan.program.display(), args = ?plan.args, cwd = %plan.cwd.display(), "spawning");
        let child = command.spawn()?;
        Ok(LocalChild { child })
    }
}

impl ChildProcess for LocalChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> BerthResult<Termination> {
        let status = self.child.wait()?;
        Ok(termination(status))
    }
}

fn termination(status: ExitStatus) -> Termination {
    match status.code() {
        Some(code) => Termination::Exited(code),
        None => Termination::Signaled(signal_of(&status)),
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(unix)]
fn set_arg0(command: &mut Command, arg0: &str) {
    use std::os::unix::process::CommandExt;
    command.arg0(arg0);
}

#[cfg(not(unix))]
fn set_arg0(_command: &mut Command, _arg0: &str) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan(script: &str) -> LaunchPlan {
        LaunchPlan {
            program: PathBuf::from("/bin/sh"),
            arg0: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: std::env::temp_dir(),
            env: vec![("PATH".to_string(), "/usr/bin:/bin".to_string())],
        }
    }

    #[test]
    fn exit_code_is_reported() {
        let mut child = LocalProcessRunner::new().spawn(&plan("exit 7")).unwrap();
        assert!(child.id() > 0);
        assert_eq!(child.wait().unwrap(), Termination::Exited(7));
    }

    #[test]
    fn signal_is_reported() {
        let mut child = LocalProcessRunner::new()
            .spawn(&plan("kill -TERM $$"))
            .unwrap();
        assert_eq!(child.wait().unwrap(), Termination::Signaled(Some(15)));
    }

    #[test]
    fn environment_is_exactly_the_plan() {
        let mut p = plan("test -z \"$HOME\" && test \"$GREETING\" = hi");
        p.env.push(("GREETING".to_string(), "hi".to_string()));
        let mut child = LocalProcessRunner::new().spawn(&p).unwrap();
        assert_eq!(child.wait().unwrap(), Termination::Exited(0));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let mut p = plan("true");
        p.program = PathBuf::from("/definitely/not/here");
        assert!(LocalProcessRunner::new().spawn(&p).is_err());
    }
}
