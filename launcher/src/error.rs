//! Failure taxonomy for the bootstrap-and-launch flow.
//!
//! Every fatal variant of [`LaunchError`] ends the process with
//! [`exit_codes::FAILURE`](crate::exit_codes::FAILURE) after its message is
//! printed. [`OptionalComponentFailure`] is reported and recovered locally.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::guidance::{ResolutionFacts, resolution_message};

/// No candidate interpreter exists or none meets the minimum version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub facts: ResolutionFacts,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&resolution_message(&self.facts))
    }
}

impl std::error::Error for ResolutionFailure {}

/// Mandatory provisioning steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateEnvironment,
    InstallManifest,
    InstallExtraPackages,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProvisionStep::CreateEnvironment => "create virtual environment",
            ProvisionStep::InstallManifest => "install Python dependencies",
            ProvisionStep::InstallExtraPackages => "install required Python packages",
        })
    }
}

/// A mandatory provisioning step failed; the environment must not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {step} {scope_adverb}: {detail}")]
pub struct ProvisionFailure {
    pub step: ProvisionStep,
    /// "locally" / "globally".
    pub scope_adverb: &'static str,
    pub detail: String,
}

/// An optional runtime component could not be installed. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to install {component} {scope_adverb}. Run manually: {manual_command}")]
pub struct OptionalComponentFailure {
    pub component: String,
    pub scope_adverb: &'static str,
    /// Literal command the user can run to retry the install.
    pub manual_command: String,
}

/// Top-level error for a launcher run.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error(transparent)]
    Provision(#[from] ProvisionFailure),

    #[error("Failed to start Python process {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lost track of the Python process: {0}")]
    Supervision(String),
}

impl LaunchError {
    /// Exit code the launcher terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        crate::exit_codes::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidates::Platform;
    use crate::core::version::{MinimumVersion, PythonVersion};

    #[test]
    fn resolution_failure_renders_guidance() {
        let err = LaunchError::from(ResolutionFailure {
            facts: ResolutionFacts {
                platform: Platform::Unix,
                minimum: MinimumVersion::new(10),
                highest_seen: Some(PythonVersion::new(3, 9, 0)),
                version_manager_detected: false,
            },
        });
        assert!(err.to_string().contains("Detected: 3.9.0."));
        assert_eq!(err.exit_code(), crate::exit_codes::FAILURE);
    }

    #[test]
    fn provision_failure_names_step_and_scope() {
        let err = ProvisionFailure {
            step: ProvisionStep::InstallManifest,
            scope_adverb: "globally",
            detail: "pip exited with status 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to install Python dependencies globally: pip exited with status 1"
        );
    }

    #[test]
    fn optional_failure_carries_manual_command() {
        let err = OptionalComponentFailure {
            component: "Playwright browsers".to_string(),
            scope_adverb: "locally",
            manual_command: "/w/.venv/bin/python -m playwright install".to_string(),
        };
        assert!(
            err.to_string()
                .ends_with("Run manually: /w/.venv/bin/python -m playwright install")
        );
    }
}
