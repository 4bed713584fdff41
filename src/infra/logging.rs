//! Tracing subscriber setup for the binary.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::AppContext;

/// Install the global subscriber: `RUST_LOG` filter (default `warn`),
/// human-readable events on stderr so stdout only carries the report.
///
/// Calling it twice is harmless; the second call keeps the first subscriber.
pub fn init(ctx: &AppContext) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(!ctx.no_color),
        )
        .try_init();
}
