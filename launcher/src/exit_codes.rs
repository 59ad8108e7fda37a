//! Stable exit codes for the launcher.

use std::process::ExitStatus;

/// Setup finished, or the supervised child exited cleanly.
pub const OK: i32 = 0;
/// Resolution, provisioning, configuration or spawn failure.
pub const FAILURE: i32 = 1;
/// Children terminated by signal `N` are reported as `SIGNAL_BASE + N`.
pub const SIGNAL_BASE: i32 = 128;

/// Map a child's exit status to the launcher's own exit code.
///
/// A normal exit propagates its code unchanged. A signal-terminated child
/// yields `128 + signal`. Anything else yields [`FAILURE`].
pub fn from_status(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_BASE + signal;
        }
    }
    FAILURE
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn exit_codes_propagate_verbatim() {
        for code in [0, 1, 7, 130, 255] {
            // Raw wait status encodes the exit code in the second byte.
            let status = ExitStatus::from_raw(code << 8);
            assert_eq!(from_status(&status), code);
        }
    }

    #[test]
    fn signal_termination_maps_above_base() {
        let status = ExitStatus::from_raw(15);
        assert_eq!(from_status(&status), SIGNAL_BASE + 15);
    }
}
