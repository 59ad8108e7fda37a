//! Launcher configuration.
//!
//! Everything the launcher reads from the process environment and from disk is
//! gathered once into an immutable [`LauncherConfig`] that is passed
//! explicitly to the resolver, provisioner and supervisor.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::candidates::{CandidateInterpreter, Platform, candidates_for, override_candidate};
use crate::core::layout::EnvironmentDescriptor;
use crate::core::scope::{Scope, environment_root};
use crate::core::version::MinimumVersion;

/// Optional settings file colocated with the package root.
pub const SETTINGS_FILE: &str = "launcher.toml";
/// Boolean-like install scope indicator (set by `npm install -g`).
pub const SCOPE_ENV: &str = "npm_config_global";
/// Overrides package root discovery.
pub const PACKAGE_ROOT_ENV: &str = "LILFETCH_PACKAGE_ROOT";
/// Replaces the candidate table with a single interpreter.
pub const PYTHON_OVERRIDE_ENV: &str = "LILFETCH_PYTHON";
/// Variable set on the child so it can import modules next to its entrypoint.
pub const ENTRYPOINT_PATH_ENV: &str = "PYTHONPATH";

/// Launcher settings (TOML).
///
/// Missing fields default to the values used by the published package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherSettings {
    /// Short tool name; the global environment lives at `~/.<tool_name>-venv`.
    pub tool_name: String,

    /// Prefix for progress messages.
    pub display_name: String,

    /// Lowest accepted Python 3 minor version.
    pub min_python_minor: u32,

    /// Dependency manifest file name, relative to the package root.
    pub manifest: String,

    /// Server script, relative to the package root.
    pub entrypoint: String,

    /// Packages installed after the manifest. Failure is fatal.
    pub extra_packages: Vec<String>,

    /// Per-candidate timeout for `--version` probes.
    pub probe_timeout_secs: u64,

    /// Best-effort installs run with the environment's interpreter.
    pub optional_components: Vec<OptionalComponentSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionalComponentSettings {
    /// Name used in progress messages, e.g. "Playwright browsers".
    pub name: String,
    /// Arguments passed to the environment's interpreter.
    pub args: Vec<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            tool_name: "lilfetch".to_string(),
            display_name: "lilFetch".to_string(),
            min_python_minor: 10,
            manifest: "requirements.txt".to_string(),
            entrypoint: "mcp_server.py".to_string(),
            extra_packages: vec!["playwright".to_string()],
            probe_timeout_secs: 10,
            optional_components: vec![OptionalComponentSettings {
                name: "Playwright browsers".to_string(),
                args: vec![
                    "-m".to_string(),
                    "playwright".to_string(),
                    "install".to_string(),
                ],
            }],
        }
    }
}

impl LauncherSettings {
    pub fn validate(&self) -> Result<()> {
        if self.tool_name.trim().is_empty() {
            return Err(anyhow!("tool_name must be non-empty"));
        }
        if self.tool_name.contains(['/', '\\']) {
            return Err(anyhow!("tool_name must not contain path separators"));
        }
        if self.display_name.trim().is_empty() {
            return Err(anyhow!("display_name must be non-empty"));
        }
        if self.manifest.trim().is_empty() {
            return Err(anyhow!("manifest must be non-empty"));
        }
        if self.entrypoint.trim().is_empty() {
            return Err(anyhow!("entrypoint must be non-empty"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(anyhow!("probe_timeout_secs must be > 0"));
        }
        if self.extra_packages.iter().any(|p| p.trim().is_empty()) {
            return Err(anyhow!("extra_packages entries must be non-empty"));
        }
        for component in &self.optional_components {
            if component.name.trim().is_empty() {
                return Err(anyhow!("optional_components.name must be non-empty"));
            }
            if component.args.is_empty() {
                return Err(anyhow!(
                    "optional_components.args for '{}' must be a non-empty array",
                    component.name
                ));
            }
        }
        Ok(())
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `LauncherSettings::default()`.
pub fn load_settings(path: &Path) -> Result<LauncherSettings> {
    if !path.exists() {
        let settings = LauncherSettings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: LauncherSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Process environment values the launcher depends on, read once at start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub scope_indicator: Option<String>,
    pub package_root_override: Option<PathBuf>,
    pub python_override: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub home_dir: Option<PathBuf>,
    /// Directory containing the running executable.
    pub exe_dir: Option<PathBuf>,
}

impl EnvSnapshot {
    pub fn capture() -> Result<Self> {
        Ok(Self {
            scope_indicator: std::env::var(SCOPE_ENV).ok(),
            package_root_override: non_empty_path(std::env::var_os(PACKAGE_ROOT_ENV)),
            python_override: non_empty_path(std::env::var_os(PYTHON_OVERRIDE_ENV)),
            working_dir: std::env::current_dir().context("read current directory")?,
            home_dir: dirs::home_dir(),
            exe_dir: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        })
    }
}

fn non_empty_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Locate the directory holding the manifest, entrypoint and settings.
///
/// Order: explicit override, then `<exe dir>/..` and `<exe dir>` if either
/// contains the settings file or `default_entrypoint`, then the working directory.
pub fn discover_package_root(snapshot: &EnvSnapshot, default_entrypoint: &str) -> PathBuf {
    if let Some(root) = &snapshot.package_root_override {
        return root.clone();
    }
    if let Some(exe_dir) = &snapshot.exe_dir {
        let candidates = exe_dir.parent().into_iter().chain(std::iter::once(exe_dir.as_path()));
        for dir in candidates {
            if dir.join(SETTINGS_FILE).is_file() || dir.join(default_entrypoint).is_file() {
                debug!(package_root = %dir.display(), "package root found next to executable");
                return dir.to_path_buf();
            }
        }
    }
    snapshot.working_dir.clone()
}

/// Best-effort install run with the environment's interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalComponent {
    pub name: String,
    pub args: Vec<OsString>,
}

/// Read-only reference to the dependency manifest; contents are opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    pub path: PathBuf,
}

impl DependencyManifest {
    pub fn is_present(&self) -> bool {
        self.path.is_file()
    }
}

/// Immutable configuration for one launcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub tool_name: String,
    pub display_name: String,
    pub platform: Platform,
    pub scope: Scope,
    pub package_root: PathBuf,
    pub environment: EnvironmentDescriptor,
    pub manifest: DependencyManifest,
    pub entrypoint: PathBuf,
    pub minimum: MinimumVersion,
    pub candidates: Vec<CandidateInterpreter>,
    pub extra_packages: Vec<String>,
    pub optional_components: Vec<OptionalComponent>,
    pub probe_timeout: Duration,
}

impl LauncherConfig {
    /// Build the run configuration. Pure apart from its inputs.
    pub fn assemble(
        snapshot: &EnvSnapshot,
        package_root: &Path,
        settings: &LauncherSettings,
        platform: Platform,
    ) -> Result<Self> {
        settings.validate()?;
        let scope = Scope::from_indicator(snapshot.scope_indicator.as_deref());
        let home_dir = match (scope, &snapshot.home_dir) {
            (_, Some(home)) => home.clone(),
            (Scope::Local, None) => snapshot.working_dir.clone(),
            (Scope::Global, None) => {
                return Err(anyhow!(
                    "cannot determine the home directory for a global install"
                ));
            }
        };
        let root = environment_root(scope, &snapshot.working_dir, &home_dir, &settings.tool_name);

        let candidates = match &snapshot.python_override {
            Some(program) => override_candidate(program.clone(), platform),
            None => candidates_for(platform),
        };

        Ok(Self {
            tool_name: settings.tool_name.clone(),
            display_name: settings.display_name.clone(),
            platform,
            scope,
            package_root: package_root.to_path_buf(),
            environment: EnvironmentDescriptor::new(root, scope, platform),
            manifest: DependencyManifest {
                path: package_root.join(&settings.manifest),
            },
            entrypoint: package_root.join(&settings.entrypoint),
            minimum: MinimumVersion::new(settings.min_python_minor),
            candidates,
            extra_packages: settings.extra_packages.clone(),
            optional_components: settings
                .optional_components
                .iter()
                .map(|c| OptionalComponent {
                    name: c.name.clone(),
                    args: c.args.iter().map(OsString::from).collect(),
                })
                .collect(),
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
        })
    }

    /// Directory exported to the child via [`ENTRYPOINT_PATH_ENV`].
    pub fn entrypoint_dir(&self) -> PathBuf {
        self.entrypoint
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.package_root.clone())
    }
}

/// Capture the environment, locate the package root and load its settings.
pub fn load_launcher_config() -> Result<LauncherConfig> {
    let snapshot = EnvSnapshot::capture()?;
    let defaults = LauncherSettings::default();
    let package_root = discover_package_root(&snapshot, &defaults.entrypoint);
    let settings = load_settings(&package_root.join(SETTINGS_FILE))?;
    LauncherConfig::assemble(&snapshot, &package_root, &settings, Platform::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(working_dir: &Path) -> EnvSnapshot {
        EnvSnapshot {
            working_dir: working_dir.to_path_buf(),
            home_dir: Some(PathBuf::from("/home/u")),
            ..EnvSnapshot::default()
        }
    }

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, LauncherSettings::default());
    }

    #[test]
    fn load_applies_partial_overrides() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "min_python_minor = 8\nextra_packages = []\n").expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.min_python_minor, 8);
        assert!(settings.extra_packages.is_empty());
        assert_eq!(settings.entrypoint, "mcp_server.py");
    }

    #[test]
    fn load_rejects_invalid_settings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "probe_timeout_secs = 0\n").expect("write");
        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("probe_timeout_secs"));
    }

    #[test]
    fn load_rejects_component_without_args() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            "[[optional_components]]\nname = \"browsers\"\nargs = []\n",
        )
        .expect("write");
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn assemble_local_scope_uses_working_dir() {
        let snap = snapshot(Path::new("/work"));
        let cfg = LauncherConfig::assemble(
            &snap,
            Path::new("/pkg"),
            &LauncherSettings::default(),
            Platform::Unix,
        )
        .expect("assemble");
        assert_eq!(cfg.scope, Scope::Local);
        assert_eq!(cfg.environment.root, PathBuf::from("/work/.venv"));
        assert_eq!(cfg.manifest.path, PathBuf::from("/pkg/requirements.txt"));
        assert_eq!(cfg.entrypoint, PathBuf::from("/pkg/mcp_server.py"));
        assert_eq!(cfg.entrypoint_dir(), PathBuf::from("/pkg"));
        assert_eq!(cfg.minimum, MinimumVersion::new(10));
        assert_eq!(cfg.candidates, candidates_for(Platform::Unix));
    }

    #[test]
    fn assemble_global_scope_uses_home() {
        let mut snap = snapshot(Path::new("/work"));
        snap.scope_indicator = Some("true".to_string());
        let cfg = LauncherConfig::assemble(
            &snap,
            Path::new("/pkg"),
            &LauncherSettings::default(),
            Platform::Unix,
        )
        .expect("assemble");
        assert_eq!(cfg.scope, Scope::Global);
        assert_eq!(cfg.environment.root, PathBuf::from("/home/u/.lilfetch-venv"));
    }

    #[test]
    fn assemble_global_scope_requires_home() {
        let mut snap = snapshot(Path::new("/work"));
        snap.scope_indicator = Some("1".to_string());
        snap.home_dir = None;
        let err = LauncherConfig::assemble(
            &snap,
            Path::new("/pkg"),
            &LauncherSettings::default(),
            Platform::Unix,
        )
        .unwrap_err();
        assert!(err.to_string().contains("home directory"));
    }

    #[test]
    fn python_override_replaces_candidates() {
        let mut snap = snapshot(Path::new("/work"));
        snap.python_override = Some(PathBuf::from("/opt/python"));
        let cfg = LauncherConfig::assemble(
            &snap,
            Path::new("/pkg"),
            &LauncherSettings::default(),
            Platform::Unix,
        )
        .expect("assemble");
        assert_eq!(cfg.candidates.len(), 1);
        assert_eq!(cfg.candidates[0].program, PathBuf::from("/opt/python"));
    }

    #[test]
    fn package_root_prefers_override() {
        let mut snap = snapshot(Path::new("/work"));
        snap.package_root_override = Some(PathBuf::from("/explicit"));
        assert_eq!(
            discover_package_root(&snap, "mcp_server.py"),
            PathBuf::from("/explicit")
        );
    }

    #[test]
    fn package_root_found_above_exe_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).expect("mkdir");
        fs::write(temp.path().join("mcp_server.py"), "").expect("write");
        let mut snap = snapshot(Path::new("/work"));
        snap.exe_dir = Some(bin);
        assert_eq!(discover_package_root(&snap, "mcp_server.py"), temp.path());
    }

    #[test]
    fn package_root_falls_back_to_working_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut snap = snapshot(Path::new("/work"));
        snap.exe_dir = Some(temp.path().join("bin"));
        assert_eq!(
            discover_package_root(&snap, "mcp_server.py"),
            PathBuf::from("/work")
        );
    }
}
