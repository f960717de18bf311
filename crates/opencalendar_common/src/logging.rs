//! Logging utilities for the OpenCalendar proxy.
//!
//! All crates log through `tracing`; this module installs the subscriber.

use tracing::{error, info, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
///
/// `RUST_LOG` is honoured on top of the default directive, e.g.
/// `RUST_LOG=tower_http=debug` to see request traces.
///
/// ```
/// use opencalendar_common::logging;
///
/// logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level for the
/// workspace crates.
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    // Workspace crates plus the request trace layer (one line per request).
    for target in ["opencalendar", "tower_http"] {
        let directive = format!("{}={}", target, level)
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into());
        filter = filter.add_directive(directive);
    }

    // try_init: a global subscriber may already be installed (tests)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}
