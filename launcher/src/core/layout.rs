//! Paths inside an isolated environment.

use std::path::{Path, PathBuf};

use crate::core::candidates::Platform;
use crate::core::scope::Scope;

/// Where the isolated environment lives and how it is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub root: PathBuf,
    pub scope: Scope,
    pub platform: Platform,
}

impl EnvironmentDescriptor {
    pub fn new(root: impl Into<PathBuf>, scope: Scope, platform: Platform) -> Self {
        Self {
            root: root.into(),
            scope,
            platform,
        }
    }

    /// Directory holding the environment's executables.
    pub fn bin_dir(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.root.join("Scripts"),
            Platform::Unix => self.root.join("bin"),
        }
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.bin_dir().join("python.exe"),
            Platform::Unix => self.bin_dir().join("python"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_layout_uses_bin() {
        let env = EnvironmentDescriptor::new("/w/.venv", Scope::Local, Platform::Unix);
        assert_eq!(env.python(), PathBuf::from("/w/.venv/bin/python"));
    }

    #[test]
    fn windows_layout_uses_scripts() {
        let env = EnvironmentDescriptor::new("venv", Scope::Global, Platform::Windows);
        assert_eq!(
            env.python(),
            PathBuf::from("venv").join("Scripts").join("python.exe")
        );
    }
}
