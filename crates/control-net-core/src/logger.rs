//! Process-wide log sinks for control-network tools.
//!
//! Two backends are offered. The `log` backend writes one line per record
//! to stderr, e.g.
//!
//! ```text
//! +0.012s DEBUG control_net::point::apriori | control point [tie_1]: a-priori from 3/3 measures
//! ```
//!
//! and is configured from [`LOG_LEVEL_ENV`]. With the `tracing` feature,
//! [`init_tracing`] installs a `tracing-subscriber` instead so that the
//! per-point spans around the compute routines are reported too.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log level, e.g. `CONTROL_NET_LOG=debug`.
pub const LOG_LEVEL_ENV: &str = "CONTROL_NET_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct NetLogger {
    max_level: LevelFilter,
    epoch: Instant,
}

impl NetLogger {
    fn line(&self, record: &Record) -> String {
        format!(
            "+{:.3}s {:<5} {} | {}",
            self.epoch.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for NetLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{}", self.line(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static NET_LOGGER: OnceLock<NetLogger> = OnceLock::new();

/// Route `log` records at or above `level` to stderr.
///
/// Only the first call installs the logger; later calls leave the existing
/// level in place and return `Ok`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if NET_LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = NET_LOGGER.get_or_init(|| NetLogger {
        max_level: level,
        epoch: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// [`init_with_level`] with the level taken from [`LOG_LEVEL_ENV`], `info`
/// when unset or not a level name.
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    let raw = std::env::var(LOG_LEVEL_ENV).ok();
    init_with_level(parse_level(raw.as_deref()))
}

fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Output format for [`init_tracing`].
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable lines with uptime stamps.
    #[default]
    Text,
    /// One flattened JSON object per event.
    Json,
}

/// Install a `tracing` subscriber filtered by [`LOG_LEVEL_ENV`].
///
/// Span close events carry the time spent in each traced compute call.
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(format: TracingFormat) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL.to_string().to_lowercase()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = match format {
        TracingFormat::Json => builder.json().flatten_event(true).finish().try_init(),
        TracingFormat::Text => builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init(),
    };
}
