//! Install scope and environment root placement.

use std::fmt;
use std::path::{Path, PathBuf};

/// Where the isolated environment lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `<working directory>/.venv`
    Local,
    /// `<home directory>/.<tool>-venv`
    Global,
}

impl Scope {
    /// Interpret a boolean-like scope indicator. Unset or unrecognised values mean local.
    pub fn from_indicator(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Scope::Global,
            _ => Scope::Local,
        }
    }

    /// Adjective used in progress messages ("Local installation detected.").
    pub fn label(self) -> &'static str {
        match self {
            Scope::Local => "Local",
            Scope::Global => "Global",
        }
    }

    /// Adverb used in progress messages ("installed locally").
    pub fn adverb(self) -> &'static str {
        match self {
            Scope::Local => "locally",
            Scope::Global => "globally",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Local => "local",
            Scope::Global => "global",
        })
    }
}

/// Root directory of the environment for `scope`.
pub fn environment_root(scope: Scope, working_dir: &Path, home_dir: &Path, tool: &str) -> PathBuf {
    match scope {
        Scope::Local => working_dir.join(".venv"),
        Scope::Global => home_dir.join(format!(".{tool}-venv")),
    }
}

/// Short description of the environment location for progress messages.
pub fn location_hint(scope: Scope, tool: &str) -> String {
    match scope {
        Scope::Local => "repo root (.venv)".to_string(),
        Scope::Global => format!("user home (~/.{tool}-venv)"),
    }
}
