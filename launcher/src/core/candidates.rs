//! Static interpreter priority table.

use std::ffi::OsString;
use std::path::PathBuf;

/// Platform family used to pick candidates and environment layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// One executable the resolver is willing to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInterpreter {
    /// Program name (looked up on `PATH`) or absolute path.
    pub program: PathBuf,
    /// Arguments placed before any others, e.g. `-3` for the Windows `py` launcher.
    pub leading_args: Vec<OsString>,
    pub platform: Platform,
    /// Lower ranks are probed first.
    pub rank: usize,
}

impl CandidateInterpreter {
    /// Human-readable command, e.g. `py -3`.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(
            self.leading_args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

struct TableEntry {
    platform: Platform,
    program: &'static str,
    leading_args: &'static [&'static str],
}

/// Candidates per platform, in priority order.
const PRIORITY_TABLE: &[TableEntry] = &[
    TableEntry {
        platform: Platform::Windows,
        program: "py",
        leading_args: &["-3"],
    },
    TableEntry {
        platform: Platform::Windows,
        program: "python",
        leading_args: &[],
    },
    TableEntry {
        platform: Platform::Unix,
        program: "python3.12",
        leading_args: &[],
    },
    TableEntry {
        platform: Platform::Unix,
        program: "python3.11",
        leading_args: &[],
    },
    TableEntry {
        platform: Platform::Unix,
        program: "python3",
        leading_args: &[],
    },
    TableEntry {
        platform: Platform::Unix,
        program: "python",
        leading_args: &[],
    },
];

/// Ordered candidates applicable to `platform`.
pub fn candidates_for(platform: Platform) -> Vec<CandidateInterpreter> {
    PRIORITY_TABLE
        .iter()
        .filter(|entry| entry.platform == platform)
        .enumerate()
        .map(|(rank, entry)| CandidateInterpreter {
            program: PathBuf::from(entry.program),
            leading_args: entry.leading_args.iter().map(OsString::from).collect(),
            platform,
            rank,
        })
        .collect()
}

/// Single-candidate list for an explicitly configured interpreter.
pub fn override_candidate(program: PathBuf, platform: Platform) -> Vec<CandidateInterpreter> {
    vec![CandidateInterpreter {
        program,
        leading_args: Vec::new(),
        platform,
        rank: 0,
    }]
}

/// Third-party version managers whose presence changes remediation advice.
pub const VERSION_MANAGERS: &[&str] = &["pyenv"];
