//! Session logger.
//!
//! Lines look like `[  1.234s  INFO session] message`, where the last field
//! is the final path segment of the record target. The elapsed clock starts
//! when the logger is installed, which for an interactive try-on session is
//! roughly when the camera is first requested.
//!
//! Both backends write to stderr so stdout stays free for command output.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

struct SessionLogger {
    level: LevelFilter,
    started: Instant,
}

fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn write_line(
    out: &mut impl Write,
    elapsed: Duration,
    level: Level,
    target: &str,
    args: &fmt::Arguments<'_>,
) -> std::io::Result<()> {
    writeln!(
        out,
        "[{:7.3}s {level:>5} {}] {args}",
        elapsed.as_secs_f64(),
        short_target(target)
    )
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_line(
                &mut std::io::stderr().lock(),
                self.started.elapsed(),
                record.level(),
                record.target(),
                record.args(),
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the session logger filtering at `level`.
///
/// Only the first call installs anything; later calls keep the original
/// level and return `Ok`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        SessionLogger {
            level,
            started: Instant::now(),
        }
    });
    if installed_now {
        log::set_logger(logger)?;
        log::set_max_level(logger.level);
    }
    Ok(())
}

/// Install a `tracing` subscriber on stderr, filtered by `RUST_LOG` (default `info`).
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
