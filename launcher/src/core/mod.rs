//! Deterministic, pure logic shared by the launcher.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod candidates;
pub mod guidance;
pub mod layout;
pub mod scope;
pub mod state;
pub mod version;
