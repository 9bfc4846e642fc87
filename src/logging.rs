//! Structured logging setup for the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "TOME_LOG";

/// Maps `-v` occurrences to a filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "tome=warn",
        1 => "tome=debug",
        _ => "tome=trace",
    }
}

/// Initialize structured logging on stderr.
///
/// `TOME_LOG` takes precedence, then `RUST_LOG`, then the level implied by
/// `verbosity`.
pub fn init_tracing(verbosity: u8, log_json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
