//! Developer diagnostics for the launcher.
//!
//! Two output channels share stderr:
//!
//! - **Tracing (this module)**: spans and events from `io::*`, filtered by
//!   `RUST_LOG` and silent below `warn` by default.
//! - **Progress lines (`io/progress`)**: the user-facing bootstrap messages.
//!   Always shown, unaffected by `RUST_LOG`.
//!
//! Nothing here writes to stdout, which belongs to the server's protocol stream.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or empty.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(DEFAULT_LEVEL.into())
        .from_env_lossy()
}

/// Install the global tracing subscriber.
///
/// Invalid `RUST_LOG` directives are skipped rather than aborting the launch.
/// Calling this more than once keeps the first subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=launcher=debug lilfetch setup
/// ```
pub fn init() {
    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
