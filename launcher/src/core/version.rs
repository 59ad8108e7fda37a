//! Python version parsing and the minimum-version check.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `major.minor` with an optional `.patch`, ignoring any prefix
/// (`Python `) and trailing pre-release text (`rc1`, `+`, ...).
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version regex is valid")
});

/// Version reported by an interpreter probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the output of `python --version`.
    ///
    /// Accepts `Python 3.12.1`, `3.12`, `3.13.0rc1`. A missing patch component
    /// is read as `0`. Returns `None` when no `major.minor` pair is present.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text.trim())?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Lowest acceptable interpreter version.
///
/// The major version is fixed: only `major == REQUIRED_MAJOR` is accepted,
/// so `4.0` does not satisfy a `3.10` minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumVersion {
    pub minor: u32,
}

impl MinimumVersion {
    pub const REQUIRED_MAJOR: u32 = 3;

    pub const fn new(minor: u32) -> Self {
        Self { minor }
    }

    pub fn is_satisfied_by(&self, version: &PythonVersion) -> bool {
        version.major == Self::REQUIRED_MAJOR && version.minor >= self.minor
    }
}

impl fmt::Display for MinimumVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", Self::REQUIRED_MAJOR, self.minor)
    }
}
