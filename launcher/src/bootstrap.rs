//! Bootstrap orchestration for `lilfetch` and `lilfetch setup`.
//!
//! Resolver and Provisioner run strictly in sequence; the first fatal failure
//! stops the run. Launching the server is left to the caller so the setup-only
//! entry point can share this path.

use tracing::instrument;

use crate::error::LaunchError;
use crate::io::command::CommandRunner;
use crate::io::config::LauncherConfig;
use crate::io::progress::Progress;
use crate::io::provision::{ProvisionReport, Provisioner};
use crate::io::resolver::{ResolvedInterpreter, Resolver};
use crate::io::supervisor::{LaunchPlan, launch};

/// A ready environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub interpreter: ResolvedInterpreter,
    pub report: ProvisionReport,
}

/// Resolve a compatible interpreter and provision the environment.
#[instrument(skip_all, fields(scope = %config.scope))]
pub fn bootstrap<R: CommandRunner>(
    runner: &R,
    config: &LauncherConfig,
    progress: &Progress,
) -> Result<BootstrapOutcome, LaunchError> {
    progress.line("Setting up Python environment...");
    progress.line(format!("{} installation detected.", config.scope.label()));

    let interpreter = Resolver::new(runner, config.platform, config.probe_timeout)
        .resolve(&config.candidates, &config.minimum)?;
    progress.line(format!(
        "Python {} version OK: {}",
        interpreter.command().display(),
        interpreter.version
    ));

    let report = Provisioner::new(runner, config, progress).provision(&interpreter)?;
    progress.line(format!("{} setup complete!", config.scope.label()));

    Ok(BootstrapOutcome {
        interpreter,
        report,
    })
}

/// Bootstrap, then run the server until it exits. Returns the exit code.
pub fn bootstrap_and_launch<R: CommandRunner>(
    runner: &R,
    config: &LauncherConfig,
    progress: &Progress,
) -> Result<i32, LaunchError> {
    bootstrap(runner, config, progress)?;
    launch(&LaunchPlan::for_server(config))
}
