use env_logger::fmt::Formatter;
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

/// Installs the global logger. `RUST_LOG` overrides `default_level`.
pub fn setup_logging(default_level: LevelFilter) {
    let colored = atty::is(atty::Stream::Stderr);
    Builder::new()
        .filter_level(default_level)
        .parse_env("RUST_LOG")
        .format(move |buf, record| format_record(buf, record, colored))
        .init();
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1B[31m",
        Level::Warn => "\x1B[33m",
        Level::Info => "\x1B[32m",
        Level::Debug => "\x1B[36m",
        Level::Trace => "\x1B[35m",
    }
}

fn format_record(buf: &mut Formatter, record: &Record, colored: bool) -> io::Result<()> {
    let timestamp = humantime::format_rfc3339_millis(SystemTime::now());
    let level = record.level();

    if colored {
        write!(buf, "{}{:>5}\x1B[0m", level_color(level), level)?;
    } else {
        write!(buf, "{:>5}", level)?;
    }
    write!(buf, " [{}] {}", timestamp, record.args())?;

    // Only include file and line for debug/trace levels
    if level >= Level::Debug {
        write!(
            buf,
            " - {}:{}",
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0)
        )?;
    }
    writeln!(buf)
}

#[macro_export]
macro_rules! log_request {
    ($method:expr, $target:expr) => {
        log::info!("→ {} {}", $method, $target)
    };
}

#[macro_export]
macro_rules! log_response {
    ($status:expr, $duration:expr, $encoding:expr, $size:expr) => {
        log::info!(
            "← {} ({:?}) - encoding: {} - {} bytes",
            $status,
            $duration,
            $encoding.unwrap_or("identity"),
            $size
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($error:expr, $context:expr) => {
        log::error!("❌ {} - {}", $context, $error)
    };
}

pub trait Loggable {
    fn log_description(&self) -> String;
}

impl<T: std::fmt::Display> Loggable for T {
    fn log_description(&self) -> String {
        self.to_string()
    }
}

impl Loggable for Path {
    fn log_description(&self) -> String {
        self.display().to_string()
    }
}

pub trait LoggingExt: Loggable {
    /// Runs `f`, logging start and completion at debug and failure at error.
    fn log_operation<F, T, E>(&self, operation: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::fmt::Display;
}

impl<S: ?Sized + Loggable> LoggingExt for S {
    fn log_operation<F, T, E>(&self, operation: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::fmt::Display,
    {
        let subject = self.log_description();
        log::debug!("Starting {} on {}", operation, subject);
        f().map(|result| {
            log::debug!("Completed {} on {}", operation, subject);
            result
        })
        .map_err(|e| {
            log::error!("Failed {} on {}: {}", operation, subject, e);
            e
        })
    }
}
