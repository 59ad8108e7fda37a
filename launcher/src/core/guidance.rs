//! Remediation text for interpreter resolution failures.

use crate::core::candidates::Platform;
use crate::core::version::{MinimumVersion, PythonVersion};

/// Facts about a failed resolution that shape the advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionFacts {
    pub platform: Platform,
    pub minimum: MinimumVersion,
    /// Highest version reported by any candidate, compatible or not.
    pub highest_seen: Option<PythonVersion>,
    pub version_manager_detected: bool,
}

/// Build the user-facing message for a resolution failure.
///
/// The first sentence states what went wrong (nothing found, or the newest
/// interpreter was too old); the rest names concrete install commands.
pub fn resolution_message(facts: &ResolutionFacts) -> String {
    let minimum = facts.minimum;
    let mut msg = match facts.highest_seen {
        Some(seen) => format!(
            "Python {minimum}+ not found. Requires {minimum}+. Detected: {seen}."
        ),
        None => format!("Python {minimum}+ not found."),
    };

    match facts.platform {
        Platform::Windows => msg.push_str(&format!(
            " Install Python {minimum}+ from python.org or the Microsoft Store, ensure \"py\" or \"python\" is on PATH, then re-run."
        )),
        Platform::Unix => msg.push_str(
            " Install via Homebrew: brew install python@3.12 (or python@3.11), or your system package manager (e.g. apt install python3.12), then add it to PATH and re-run.",
        ),
    }

    if facts.version_manager_detected {
        msg.push_str(" If using pyenv, run: pyenv install 3.12.0 && pyenv global 3.12.0");
    }
    msg
}
