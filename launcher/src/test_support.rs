//! Test-only helpers: a scripted command runner, a temporary package layout
//! and a channel-backed signal source.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::candidates::Platform;
use crate::io::command::{CommandRunner, CommandSpec, ProbeOutput, StepStatus};
use crate::io::config::{EnvSnapshot, LauncherConfig, LauncherSettings};
use crate::io::supervisor::{ForwardedSignal, SignalSource};

/// Successful probe printing `stdout`.
pub fn probe_ok(stdout: &str) -> ProbeOutput {
    ProbeOutput {
        success: true,
        stdout: stdout.to_string(),
        stderr: String::new(),
        timed_out: false,
    }
}

/// Fake [`CommandRunner`] with scripted outcomes.
///
/// - Probes answer only for commands registered with [`with_probe`](Self::with_probe)
///   (matched on the full rendered command); anything else behaves like a
///   missing program.
/// - Runs succeed unless a registered failure fragment occurs in the rendered
///   command. A successful `-m venv <dir>` run creates `<dir>`, like the real tool.
/// - Every invocation is recorded in order.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    probes: HashMap<String, ProbeOutput>,
    run_failures: Vec<(String, i32)>,
    invocations: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(mut self, command: &str, output: ProbeOutput) -> Self {
        self.probes.insert(command.to_string(), output);
        self
    }

    /// Make any run whose rendered command contains `fragment` exit with `code`.
    pub fn with_run_failure(mut self, fragment: &str, code: i32) -> Self {
        self.run_failures.push((fragment.to_string(), code));
        self
    }

    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.borrow().clone()
    }

    /// Rendered commands of every `run` and `probe`, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(CommandSpec::display)
            .collect()
    }

    /// Number of recorded invocations whose rendered command contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.rendered()
            .iter()
            .filter(|cmd| cmd.contains(fragment))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn probe(&self, spec: &CommandSpec, _timeout: Duration) -> Result<ProbeOutput> {
        self.invocations.borrow_mut().push(spec.clone());
        self.probes
            .get(&spec.display())
            .cloned()
            .ok_or_else(|| anyhow!("spawn command: {} not found", spec.program.display()))
    }

    fn run(&self, spec: &CommandSpec) -> Result<StepStatus> {
        self.invocations.borrow_mut().push(spec.clone());
        let rendered = spec.display();
        if let Some((_, code)) = self
            .run_failures
            .iter()
            .find(|(fragment, _)| rendered.contains(fragment.as_str()))
        {
            return Ok(StepStatus {
                success: false,
                code: Some(*code),
            });
        }
        if let Some(pos) = spec.args.iter().position(|arg| arg == "venv")
            && pos > 0
            && spec.args[pos - 1] == "-m"
            && let Some(dir) = spec.args.get(pos + 1)
        {
            fs::create_dir_all(dir)?;
        }
        Ok(StepStatus {
            success: true,
            code: Some(0),
        })
    }
}

/// Temporary package root, working directory and home directory.
pub struct TestPackage {
    temp: TempDir,
}

impl TestPackage {
    /// Create a package root containing a manifest and entrypoint.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let pkg = temp.path().join("pkg");
        fs::create_dir_all(&pkg)?;
        fs::create_dir_all(temp.path().join("work"))?;
        fs::create_dir_all(temp.path().join("home"))?;
        fs::write(pkg.join("requirements.txt"), "crawl4ai\n")?;
        fs::write(pkg.join("mcp_server.py"), "print('hello')\n")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn package_root(&self) -> PathBuf {
        self.temp.path().join("pkg")
    }

    pub fn working_dir(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    pub fn home_dir(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    pub fn remove_manifest(&self) -> Result<()> {
        fs::remove_file(self.package_root().join("requirements.txt"))?;
        Ok(())
    }

    /// Unix configuration for this layout; `scope_indicator` mimics `npm_config_global`.
    pub fn config(&self, scope_indicator: Option<&str>) -> Result<LauncherConfig> {
        self.config_with(scope_indicator, &LauncherSettings::default())
    }

    pub fn config_with(
        &self,
        scope_indicator: Option<&str>,
        settings: &LauncherSettings,
    ) -> Result<LauncherConfig> {
        let snapshot = EnvSnapshot {
            scope_indicator: scope_indicator.map(str::to_string),
            working_dir: self.working_dir(),
            home_dir: Some(self.home_dir()),
            ..EnvSnapshot::default()
        };
        LauncherConfig::assemble(&snapshot, &self.package_root(), settings, Platform::Unix)
    }
}

/// Channel-backed signal source; tests push signals through the sender.
impl SignalSource for UnboundedReceiver<ForwardedSignal> {
    async fn recv(&mut self) -> Option<ForwardedSignal> {
        UnboundedReceiver::recv(self).await
    }
}
