//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: service logs at `info`, while the
/// per-statement logging of sqlx and the HTTP stack stays quiet.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn,hyper=warn,tower_http=info";

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over `default_directives` when set. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // JSON logs + timestamps.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
