//! Environment provisioning.
//!
//! Drives [`ProvisioningState`] forward through three transitions:
//!
//! 1. create the virtual environment if its root is absent (fatal on failure);
//! 2. upgrade pip (best effort), install the manifest and extra packages
//!    (fatal on failure); always re-run so the environment converges;
//! 3. attempt optional components (never fatal; failures are reported with a
//!    manual command).

use tracing::{debug, info, instrument, warn};

use crate::core::scope::location_hint;
use crate::core::state::ProvisioningState;
use crate::error::{OptionalComponentFailure, ProvisionFailure, ProvisionStep};
use crate::io::command::{CommandRunner, CommandSpec};
use crate::io::config::LauncherConfig;
use crate::io::progress::Progress;
use crate::io::resolver::ResolvedInterpreter;

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub state: ProvisioningState,
    /// Whether the environment directory was created by this run.
    pub created: bool,
    pub optional_failures: Vec<OptionalComponentFailure>,
}

/// Owns the provisioning state for one run.
pub struct Provisioner<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a LauncherConfig,
    progress: &'a Progress,
    state: ProvisioningState,
}

impl<'a, R: CommandRunner> Provisioner<'a, R> {
    pub fn new(runner: &'a R, config: &'a LauncherConfig, progress: &'a Progress) -> Self {
        let state = ProvisioningState::observe(config.environment.root.exists());
        Self {
            runner,
            config,
            progress,
            state,
        }
    }

    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    #[instrument(skip_all, fields(root = %self.config.environment.root.display(), scope = %self.config.scope))]
    pub fn provision(
        mut self,
        interpreter: &ResolvedInterpreter,
    ) -> Result<ProvisionReport, ProvisionFailure> {
        let created = self.create_environment(interpreter)?;
        self.install_dependencies()?;
        let optional_failures = self.install_optional_components();
        debug_assert!(self.state.is_terminal());
        Ok(ProvisionReport {
            state: self.state,
            created,
            optional_failures,
        })
    }

    fn advance(&mut self, next: ProvisioningState) {
        self.state = self.state.advance(next);
        debug!(state = %self.state, "provisioning state advanced");
    }

    fn fatal(&self, step: ProvisionStep, detail: String) -> ProvisionFailure {
        ProvisionFailure {
            step,
            scope_adverb: self.config.scope.adverb(),
            detail,
        }
    }

    /// Run a mandatory step; any spawn error or non-zero exit is fatal.
    fn run_required(&self, step: ProvisionStep, spec: &CommandSpec) -> Result<(), ProvisionFailure> {
        match self.runner.run(spec) {
            Ok(status) if status.success => Ok(()),
            Ok(status) => {
                warn!(command = %spec.display(), code = ?status.code, "required step failed");
                Err(self.fatal(step, format!("`{}` failed with {}", spec.display(), status.describe())))
            }
            Err(err) => Err(self.fatal(step, format!("`{}`: {err:#}", spec.display()))),
        }
    }

    fn create_environment(
        &mut self,
        interpreter: &ResolvedInterpreter,
    ) -> Result<bool, ProvisionFailure> {
        if self.state >= ProvisioningState::Created {
            debug!("environment exists, skipping creation");
            return Ok(false);
        }
        let root = &self.config.environment.root;
        let spec = interpreter.command().args(["-m", "venv"]).arg(root);
        self.run_required(ProvisionStep::CreateEnvironment, &spec)?;
        self.advance(ProvisioningState::Created);
        self.progress.line(format!(
            "Virtual environment created at {}",
            location_hint(self.config.scope, &self.config.tool_name)
        ));
        Ok(true)
    }

    fn install_dependencies(&mut self) -> Result<(), ProvisionFailure> {
        let python = self.config.environment.python();
        let adverb = self.config.scope.adverb();

        let upgrade = CommandSpec::new(&python).args(["-m", "pip", "install", "--upgrade", "pip"]);
        match self.runner.run(&upgrade) {
            Ok(status) if status.success => debug!("pip upgraded"),
            Ok(status) => warn!(code = ?status.code, "pip upgrade failed, continuing"),
            Err(err) => warn!(err = %format!("{err:#}"), "pip upgrade could not start, continuing"),
        }

        if self.config.manifest.is_present() {
            let install = CommandSpec::new(&python)
                .args(["-m", "pip", "install", "-r"])
                .arg(&self.config.manifest.path);
            self.run_required(ProvisionStep::InstallManifest, &install)?;
            self.progress
                .line(format!("Python dependencies installed {adverb}."));
        } else {
            info!(manifest = %self.config.manifest.path.display(), "no manifest, skipping dependency install");
        }

        if !self.config.extra_packages.is_empty() {
            let install = CommandSpec::new(&python)
                .args(["-m", "pip", "install"])
                .args(self.config.extra_packages.iter());
            self.run_required(ProvisionStep::InstallExtraPackages, &install)?;
            self.progress.line(format!(
                "Python packages installed {adverb}: {}.",
                self.config.extra_packages.join(", ")
            ));
        }

        self.advance(ProvisioningState::DependenciesInstalled);
        Ok(())
    }

    fn install_optional_components(&mut self) -> Vec<OptionalComponentFailure> {
        let python = self.config.environment.python();
        let adverb = self.config.scope.adverb();
        let mut failures = Vec::new();

        for component in &self.config.optional_components {
            let spec = CommandSpec::new(&python).args(component.args.iter().cloned());
            let succeeded = match self.runner.run(&spec) {
                Ok(status) => status.success,
                Err(err) => {
                    warn!(component = %component.name, err = %format!("{err:#}"), "optional component could not start");
                    false
                }
            };
            if succeeded {
                self.progress
                    .line(format!("{} successfully installed {adverb}.", component.name));
                continue;
            }
            let failure = OptionalComponentFailure {
                component: component.name.clone(),
                scope_adverb: adverb,
                manual_command: spec.display(),
            };
            self.progress.line(&failure);
            failures.push(failure);
        }

        self.advance(ProvisioningState::OptionalComponentsAttempted);
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::PythonVersion;
    use crate::io::config::LauncherSettings;
    use crate::test_support::{ScriptedRunner, TestPackage};
    use std::path::PathBuf;

    fn interpreter() -> ResolvedInterpreter {
        ResolvedInterpreter {
            program: PathBuf::from("python3.12"),
            leading_args: Vec::new(),
            version: PythonVersion::new(3, 12, 1),
        }
    }

    fn progress() -> Progress {
        Progress::new("test")
    }

    #[test]
    fn fresh_environment_runs_every_stage_in_order() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new();
        let progress = progress();

        let report = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("provision");

        assert!(report.created);
        assert_eq!(report.state, ProvisioningState::OptionalComponentsAttempted);
        assert!(report.optional_failures.is_empty());

        let venv = cfg.environment.root.display().to_string();
        let python = cfg.environment.python().display().to_string();
        let manifest = cfg.manifest.path.display().to_string();
        assert_eq!(
            runner.rendered(),
            vec![
                format!("python3.12 -m venv {venv}"),
                format!("{python} -m pip install --upgrade pip"),
                format!("{python} -m pip install -r {manifest}"),
                format!("{python} -m pip install playwright"),
                format!("{python} -m playwright install"),
            ]
        );
    }

    #[test]
    fn second_run_does_not_recreate_environment() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new();
        let progress = progress();

        let first = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("first");
        let second = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("second");

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(runner.count_matching("-m venv"), 1);
        assert_eq!(runner.count_matching("-m pip install -r"), 2);
    }

    #[test]
    fn existing_environment_starts_at_created() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        std::fs::create_dir_all(&cfg.environment.root).expect("mkdir");
        let runner = ScriptedRunner::new();
        let progress = progress();

        let provisioner = Provisioner::new(&runner, &cfg, &progress);
        assert_eq!(provisioner.state(), ProvisioningState::Created);
        provisioner.provision(&interpreter()).expect("provision");
        assert_eq!(runner.count_matching("-m venv"), 0);
        assert_eq!(runner.count_matching("-m pip install -r"), 1);
    }

    #[test]
    fn venv_failure_is_fatal() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new().with_run_failure("-m venv", 1);
        let progress = progress();

        let err = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .unwrap_err();
        assert_eq!(err.step, ProvisionStep::CreateEnvironment);
        assert_eq!(runner.invocations().len(), 1);
    }

    #[test]
    fn manifest_failure_is_fatal_and_stops_before_optional_components() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(Some("true")).expect("config");
        let runner = ScriptedRunner::new().with_run_failure("install -r", 1);
        let progress = progress();

        let err = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .unwrap_err();
        assert_eq!(err.step, ProvisionStep::InstallManifest);
        assert_eq!(err.scope_adverb, "globally");
        assert_eq!(runner.count_matching("playwright"), 0);
    }

    #[test]
    fn pip_upgrade_failure_is_not_fatal() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new().with_run_failure("--upgrade pip", 2);
        let progress = progress();

        let report = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("provision");
        assert_eq!(report.state, ProvisioningState::OptionalComponentsAttempted);
    }

    #[test]
    fn missing_manifest_skips_manifest_install() {
        let pkg = TestPackage::new().expect("package");
        pkg.remove_manifest().expect("remove");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new();
        let progress = progress();

        Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("provision");
        assert_eq!(runner.count_matching("install -r"), 0);
        assert_eq!(runner.count_matching("pip install playwright"), 1);
    }

    #[test]
    fn optional_component_failure_is_reported_not_fatal() {
        let pkg = TestPackage::new().expect("package");
        let cfg = pkg.config(None).expect("config");
        let runner = ScriptedRunner::new().with_run_failure("-m playwright install", 1);
        let progress = progress();

        let report = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("provision");
        assert_eq!(report.state, ProvisioningState::OptionalComponentsAttempted);
        assert_eq!(report.optional_failures.len(), 1);
        let failure = &report.optional_failures[0];
        assert_eq!(failure.component, "Playwright browsers");
        assert_eq!(
            failure.manual_command,
            format!("{} -m playwright install", cfg.environment.python().display())
        );
    }

    #[test]
    fn empty_extra_packages_skip_extra_install() {
        let pkg = TestPackage::new().expect("package");
        let settings = LauncherSettings {
            extra_packages: Vec::new(),
            optional_components: Vec::new(),
            ..LauncherSettings::default()
        };
        let cfg = pkg.config_with(None, &settings).expect("config");
        let runner = ScriptedRunner::new();
        let progress = progress();

        let report = Provisioner::new(&runner, &cfg, &progress)
            .provision(&interpreter())
            .expect("provision");
        assert_eq!(report.state, ProvisioningState::OptionalComponentsAttempted);
        assert_eq!(runner.count_matching("playwright"), 0);
        assert_eq!(runner.invocations().len(), 3);
    }
}
