//! Tracing setup for the command-line tool.
//!
//! Library code only emits `tracing` events; hosts embedding the crate wire
//! their own subscriber.

/// Install a compact stderr subscriber filtered by `RUST_LOG`, defaulting to
/// `warn` so chart output on stdout stays clean.
///
/// Returns `false` if a global subscriber was already set.
#[must_use]
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
