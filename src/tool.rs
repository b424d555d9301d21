use std::{
    ffi::OsStr,
    fmt,
    path::Path,
    process::{Command, ExitStatus},
};

use anyhow::Context;

/// Outcome of running an external tool.
///
/// A tool that could not be spawned, was killed by a signal, or exited with a non-zero code are
/// all just failures; only the exit code (if any) is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    code: Option<i32>,
}

#[allow(dead_code)]
impl ToolStatus {
    pub fn from_code(code: i32) -> ToolStatus {
        ToolStatus { code: Some(code) }
    }

    pub fn no_code() -> ToolStatus {
        ToolStatus { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        ToolStatus {
            code: status.code(),
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit_code={code}"),
            None => write!(f, "no exit code"),
        }
    }
}

pub trait ToolRunner {
    /// Runs `program` with `args` and blocks until it exits.
    fn run(&mut self, program: &Path, args: &[&OsStr]) -> ToolStatus;
}

/// Spawns the tools as child processes that share our stdio, so compiler diagnostics end up
/// in the terminal.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, program: &Path, args: &[&OsStr]) -> ToolStatus {
        debug!(program = %program.display(), ?args, "running");
        match Command::new(program).args(args).status() {
            Ok(status) => status.into(),
            Err(error) => {
                warn!("could not run {}: {error}", program.display());
                ToolStatus::no_code()
            }
        }
    }
}

/// Unique temporary file the compiler writes its binary output to.
///
/// The file is removed when the guard is dropped.
pub struct Artifact {
    path: tempfile::TempPath,
}

impl Artifact {
    pub fn acquire() -> anyhow::Result<Artifact> {
        let path = tempfile::Builder::new()
            .prefix("shader-")
            .suffix(".spv")
            .tempfile()
            .context("could not create temporary file for the compiled shader")?
            .into_temp_path();
        Ok(Artifact { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
