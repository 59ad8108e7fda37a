//! Python environment bootstrapper and MCP server launcher.
//!
//! `lilfetch` finds a compatible Python 3 interpreter, provisions a virtual
//! environment for the server's dependencies, then runs the server with its
//! standard streams passed through and its exit status propagated. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (version rules, candidate table,
//!   scope and layout, provisioning state, remediation text). No I/O.
//! - **[`io`]**: Side-effecting operations (subprocesses, configuration,
//!   resolution, provisioning, supervision). Subprocesses go through the
//!   [`io::command::CommandRunner`] trait so tests can script them.
//!
//! [`bootstrap`] coordinates the stages for the CLI.

pub mod bootstrap;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
