//! Interpreter resolution.
//!
//! Probes candidates in priority order and returns the first whose reported
//! version satisfies the minimum. Priority wins over version magnitude: a
//! higher-ranked candidate that just meets the threshold beats a newer
//! lower-ranked one.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::core::candidates::{CandidateInterpreter, Platform, VERSION_MANAGERS};
use crate::core::guidance::ResolutionFacts;
use crate::core::version::{MinimumVersion, PythonVersion};
use crate::error::ResolutionFailure;
use crate::io::command::{CommandRunner, CommandSpec};

/// Interpreter chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterpreter {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
    pub version: PythonVersion,
}

impl ResolvedInterpreter {
    /// Command invoking this interpreter, ready for further arguments.
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.program).args(self.leading_args.iter().cloned())
    }
}

/// Probes candidate interpreters through a [`CommandRunner`].
pub struct Resolver<'a, R: CommandRunner> {
    runner: &'a R,
    platform: Platform,
    probe_timeout: Duration,
}

impl<'a, R: CommandRunner> Resolver<'a, R> {
    pub fn new(runner: &'a R, platform: Platform, probe_timeout: Duration) -> Self {
        Self {
            runner,
            platform,
            probe_timeout,
        }
    }

    #[instrument(skip_all, fields(minimum = %minimum, candidates = candidates.len()))]
    pub fn resolve(
        &self,
        candidates: &[CandidateInterpreter],
        minimum: &MinimumVersion,
    ) -> Result<ResolvedInterpreter, ResolutionFailure> {
        let mut highest_seen: Option<PythonVersion> = None;

        for candidate in candidates {
            let Some(version) = self.probe_version(candidate) else {
                continue;
            };
            highest_seen = highest_seen.max(Some(version));
            if minimum.is_satisfied_by(&version) {
                info!(candidate = %candidate.display(), %version, "interpreter selected");
                return Ok(ResolvedInterpreter {
                    program: candidate.program.clone(),
                    leading_args: candidate.leading_args.clone(),
                    version,
                });
            }
            debug!(candidate = %candidate.display(), %version, "interpreter below minimum");
        }

        let version_manager_detected = self.detect_version_manager();
        Err(ResolutionFailure {
            facts: ResolutionFacts {
                platform: self.platform,
                minimum: *minimum,
                highest_seen,
                version_manager_detected,
            },
        })
    }

    /// Version reported by `candidate`, or `None` if it is missing or unusable.
    fn probe_version(&self, candidate: &CandidateInterpreter) -> Option<PythonVersion> {
        let spec = CommandSpec::new(&candidate.program)
            .args(candidate.leading_args.iter().cloned())
            .arg("--version");
        let output = match self.runner.probe(&spec, self.probe_timeout) {
            Ok(output) => output,
            Err(err) => {
                debug!(candidate = %candidate.display(), err = %format!("{err:#}"), "candidate unavailable");
                return None;
            }
        };
        if !output.success {
            debug!(candidate = %candidate.display(), timed_out = output.timed_out, "version probe failed");
            return None;
        }
        // Python 2 and some shims print the version on stderr.
        PythonVersion::parse(&output.stdout).or_else(|| PythonVersion::parse(&output.stderr))
    }

    fn detect_version_manager(&self) -> bool {
        VERSION_MANAGERS.iter().any(|manager| {
            let spec = CommandSpec::new(*manager).arg("--version");
            matches!(self.runner.probe(&spec, self.probe_timeout), Ok(out) if out.success)
        })
    }
}
