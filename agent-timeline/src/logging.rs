//! Tracing subscriber setup for the binaries

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `level`; an unparsable level falls back to `info`.
/// Calling this twice is harmless.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
