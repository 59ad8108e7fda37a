//! Process supervision.
//!
//! Spawns the server inside the provisioned environment with all three
//! standard streams inherited, forwards interrupt and termination signals to
//! it, and turns its exit status into the launcher's exit code.
//!
//! The launch phase runs on a current-thread tokio runtime and waits on two
//! events only: the child exiting, or a signal arriving. Signal listeners are
//! registered before the child is spawned and dropped when supervision ends.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, instrument};

use crate::error::LaunchError;
use crate::exit_codes;
use crate::io::config::{ENTRYPOINT_PATH_ENV, LauncherConfig};

/// Signals relayed from the launcher to its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedSignal {
    Interrupt,
    Terminate,
}

/// Stream of signals received by the launcher.
pub trait SignalSource {
    /// Next signal, or `None` once the source can deliver no more.
    fn recv(&mut self) -> impl Future<Output = Option<ForwardedSignal>>;
}

/// Signal listeners installed on the launcher process.
#[cfg(unix)]
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Install SIGINT and SIGTERM listeners. Must be called inside a runtime.
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<ForwardedSignal> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|()| ForwardedSignal::Interrupt),
            received = self.terminate.recv() => received.map(|()| ForwardedSignal::Terminate),
        }
    }
}

/// Ctrl-C listener. The console already delivers Ctrl-C to every process
/// attached to it, so received events are only logged.
#[cfg(windows)]
pub struct OsSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl OsSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }
}

#[cfg(windows)]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<ForwardedSignal> {
        self.ctrl_c
            .recv()
            .await
            .map(|()| ForwardedSignal::Interrupt)
    }
}

/// The server command line and the environment overrides applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Added to (or replacing entries of) the inherited environment.
    pub envs: Vec<(OsString, OsString)>,
}

impl LaunchPlan {
    /// `<env python> <entrypoint>` with `PYTHONPATH` set to the entrypoint's directory.
    pub fn for_server(config: &LauncherConfig) -> Self {
        Self {
            program: config.environment.python(),
            args: vec![config.entrypoint.clone().into_os_string()],
            envs: vec![(
                OsString::from(ENTRYPOINT_PATH_ENV),
                config.entrypoint_dir().into_os_string(),
            )],
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

/// Run the server to completion and return the launcher's exit code.
pub fn launch(plan: &LaunchPlan) -> Result<i32, LaunchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| LaunchError::Supervision(format!("start runtime: {err}")))?;

    runtime.block_on(async {
        let mut signals = OsSignals::register()
            .map_err(|err| LaunchError::Supervision(format!("install signal listeners: {err}")))?;
        let child = spawn(plan)?;
        supervise(child, &mut signals).await
    })
}

/// Spawn the server. Must be called inside a runtime.
#[instrument(skip_all, fields(program = %plan.program.display()))]
pub fn spawn(plan: &LaunchPlan) -> Result<Child, LaunchError> {
    let child = plan.to_command().spawn().map_err(|source| LaunchError::Spawn {
        program: plan.program.clone(),
        source,
    })?;
    debug!(pid = ?child.id(), "child spawned");
    Ok(child)
}

/// Wait for `child` to exit, forwarding every signal from `signals` to it.
pub async fn supervise<S: SignalSource>(
    mut child: Child,
    signals: &mut S,
) -> Result<i32, LaunchError> {
    let pid = child.id();
    let mut listening = true;

    loop {
        tokio::select! {
            biased;

            received = signals.recv(), if listening => match received {
                Some(signal) => forward(pid, signal),
                None => {
                    debug!("signal source closed");
                    listening = false;
                }
            },
            status = child.wait() => {
                let status = status
                    .map_err(|err| LaunchError::Supervision(format!("wait for child: {err}")))?;
                let code = exit_codes::from_status(&status);
                info!(%status, code, "child exited");
                return Ok(code);
            }
        }
    }
}

#[cfg(unix)]
fn forward(pid: Option<u32>, signal: ForwardedSignal) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        debug!(?signal, "child already reaped, signal dropped");
        return;
    };
    let sig = match signal {
        ForwardedSignal::Interrupt => Signal::SIGINT,
        ForwardedSignal::Terminate => Signal::SIGTERM,
    };
    match kill(Pid::from_raw(pid), sig) {
        Ok(()) => debug!(pid, %sig, "signal forwarded"),
        Err(Errno::ESRCH) => debug!(pid, %sig, "child already exited"),
        Err(err) => tracing::warn!(pid, %sig, %err, "failed to forward signal"),
    }
}

#[cfg(not(unix))]
fn forward(_pid: Option<u32>, signal: ForwardedSignal) {
    debug!(?signal, "console delivers the signal to the child");
}
