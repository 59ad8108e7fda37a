//! I/O helpers for the launcher: subprocesses, configuration, and the three
//! bootstrap stages.

pub mod command;
pub mod config;
pub mod process;
pub mod progress;
pub mod provision;
pub mod resolver;
pub mod supervisor;
