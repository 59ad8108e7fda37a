//! User-facing progress lines.
//!
//! Progress is product output and always goes to stderr, prefixed with the
//! tool's display name. Developer diagnostics use `tracing` instead (see
//! [`crate::logging`]).

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct Progress {
    display_name: String,
}

impl Progress {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    pub fn line(&self, message: impl Display) {
        eprintln!("{}", self.format(message));
    }

    pub fn format(&self, message: impl Display) -> String {
        format!("{}: {message}", self.display_name)
    }
}
