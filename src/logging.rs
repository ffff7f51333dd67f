//! Log output for the command-line tool.
//!
//! The library only emits `tracing` events; the binary decides where they
//! go. Events are written to stderr so stdout carries just the final
//! confirmation line. `RUST_LOG` overrides the level chosen on the command
//! line.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Calling this twice is harmless; the
/// second call is ignored.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
