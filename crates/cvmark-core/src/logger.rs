//! Stderr logging for the marker crates.
//!
//! Records from `cvmark*` targets are shown at the requested level. Records
//! from other crates (image decoders, encoders) only reach stderr at `Warn`
//! or above, so `-vvv` traces the recognizer without drowning it in
//! dependency chatter. Lines look like `[  0.012s DEBUG detect] message`.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

const TARGET_PREFIX: &str = "cvmark";

/// Map a `-v` count to a level: warn, info, debug, then trace.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Short stage name for a module path: `cvmark_detect::locate` -> `detect`.
fn stage(target: &str) -> &str {
    let head = target.split("::").next().unwrap_or(target);
    match head.strip_prefix(TARGET_PREFIX) {
        Some("") => TARGET_PREFIX,
        Some(rest) => rest.trim_start_matches(['_', '-']),
        None => head,
    }
}

fn format_line(elapsed: f64, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    format!("[{:7.3}s {:>5} {}] {}", elapsed, level, stage(target), args)
}

struct MarkerLogger {
    level: LevelFilter,
    started: Instant,
}

impl MarkerLogger {
    fn admits(&self, level: Level, target: &str) -> bool {
        if target.starts_with(TARGET_PREFIX) {
            level <= self.level
        } else {
            level <= Level::Warn
        }
    }
}

impl Log for MarkerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.admits(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<MarkerLogger> = OnceLock::new();

/// Install the stderr logger with the provided level for marker crates.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| MarkerLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level.max(LevelFilter::Warn));
    }
    Ok(())
}

/// Default `tracing` directives for a level: marker crates at `level`,
/// everything else at `warn`.
pub fn tracing_directives(level: LevelFilter) -> String {
    let level = level.to_string().to_ascii_lowercase();
    ["cvmark", "cvmark_core", "cvmark_codec", "cvmark_detect", "cvmark_print"]
        .iter()
        .fold("warn".to_string(), |acc, krate| format!("{acc},{krate}={level}"))
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over `level` when set.
///
/// Span close events carry the time spent in each instrumented pass.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_directives(level)));
    let builder = tracing_fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
