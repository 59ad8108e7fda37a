//! Command execution abstraction.
//!
//! The [`CommandRunner`] trait decouples the resolver and provisioner from
//! real subprocesses. Tests use scripted runners that return predetermined
//! outcomes and record every invocation.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::instrument;

use crate::io::process::{run_command_passthrough, run_command_with_timeout};

/// Upper bound on captured probe output.
const PROBE_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-like rendering for messages, e.g. `/w/.venv/bin/python -m playwright install`.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Result of a short-lived probe whose output is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Result of a provisioning step whose output went to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl StepStatus {
    /// Short description for error details, e.g. `exit status 1`.
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Abstraction over executing external commands.
pub trait CommandRunner {
    /// Run `spec` to completion, capturing its output. Errors when the program cannot be started.
    fn probe(&self, spec: &CommandSpec, timeout: Duration) -> Result<ProbeOutput>;

    /// Run `spec` with its output shown to the user. Errors when the program cannot be started.
    fn run(&self, spec: &CommandSpec) -> Result<StepStatus>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %spec.display()))]
    fn probe(&self, spec: &CommandSpec, timeout: Duration) -> Result<ProbeOutput> {
        let output = run_command_with_timeout(spec.to_command(), timeout, PROBE_OUTPUT_LIMIT_BYTES)?;
        Ok(ProbeOutput {
            success: output.status.success() && !output.timed_out,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: output.timed_out,
        })
    }

    #[instrument(skip_all, fields(command = %spec.display()))]
    fn run(&self, spec: &CommandSpec) -> Result<StepStatus> {
        let status = run_command_passthrough(spec.to_command())?;
        Ok(StepStatus {
            success: status.success(),
            code: status.code(),
        })
    }
}
