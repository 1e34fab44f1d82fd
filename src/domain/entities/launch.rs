//! Launch directive entity

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The single process an image starts: program plus literal arguments,
/// executed without a shell in `workdir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDirective {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    workdir: PathBuf,
}

impl LaunchDirective {
    pub fn new(program: impl Into<String>, args: Vec<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: workdir.into(),
        }
    }

    /// Build from an argv-style command (`["python", "bot_main.py"]`).
    pub fn from_command(command: &[String], workdir: &Path) -> Result<Self, String> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| "launch command must not be empty".to_string())?;
        if program.trim().is_empty() {
            return Err("launch program must not be blank".to_string());
        }
        Ok(Self::new(program.clone(), args.to_vec(), workdir))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory inside the image (absolute)
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Stable rendering hashed into the launch stage key.
    pub fn canonical(&self) -> String {
        let mut out = format!("workdir={}\n", self.workdir.display());
        for arg in self.argv() {
            out.push_str(&format!("{}:{}\n", arg.len(), arg));
        }
        out
    }
}

impl fmt::Display for LaunchDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.argv().iter().map(|a| format!("{:?}", a)).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}
