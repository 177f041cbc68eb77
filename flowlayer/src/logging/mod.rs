//! Logging setup.
//!
//! Installs a `tracing` subscriber for binaries embedding the library. The
//! filter comes from `RUST_LOG` when set, otherwise from the given default.
//! Initialization is idempotent; a second call leaves the existing
//! subscriber in place.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

fn timer() -> LocalTime<&'static [time::format_description::BorrowedFormatItem<'static>]> {
    LocalTime::new(time::macros::format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ))
}

/// Log to stderr.
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_timer(timer())
        .with_writer(io::stderr)
        .try_init();
}

/// Log to a daily-rolling file in `directory`.
///
/// Returns the appender guard; dropping it stops the background writer, so
/// callers keep it alive for the lifetime of the process.
pub fn init_with_file(default_filter: &str, directory: &Path, file_prefix: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(directory, file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_timer(timer())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    guard
}
