//! Structured logging.
//!
//! # Responsibilities
//! - Install the process-wide `tracing` subscriber exactly once
//! - Gate every record on the shared [`AtomicLevel`]
//! - Select JSON (production) or colored console (development) output
//! - Flush stdout on exit, tolerating streams that cannot be synced
//!
//! # Design Decisions
//! - The encoding is fixed at init; only the threshold changes at runtime
//! - The level filter is evaluated per event, never cached per callsite
//! - Timestamps come from an injectable [`Clock`] so tests are deterministic
//! - The component name is the event target (`target: "server-debug"`),
//!   written under the `component` key in JSON records

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{self, FilterFn};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use crate::observability::level::{AtomicLevel, InvalidLevelError, Level};

/// ISO-8601 with milliseconds, e.g. `2024-01-02T03:04:05.000Z`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Source of timestamps for log records.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct ClockTimer(Arc<dyn Clock>);

impl FormatTime for ClockTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", self.0.now().format(TIME_FORMAT))
    }
}

/// One JSON object per line: `timestamp`, `level`, `component`, `message`,
/// then the event's own fields in the order they were recorded.
struct JsonFormat {
    clock: Arc<dyn Clock>,
}

impl<S, N> FormatEvent<S, N> for JsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = JsonFields::default();
        event.record(&mut fields);

        write!(
            writer,
            "{{\"timestamp\":{},\"level\":{},\"component\":{}",
            Value::from(self.clock.now().format(TIME_FORMAT).to_string()),
            Value::from(meta.level().to_string()),
            Value::from(meta.target()),
        )?;
        if let Some(message) = fields.message {
            write!(writer, ",\"message\":{}", Value::from(message))?;
        }
        for (name, value) in fields.rest {
            write!(writer, ",{}:{}", Value::from(name), value)?;
        }
        writeln!(writer, "}}")
    }
}

#[derive(Default)]
struct JsonFields {
    message: Option<String>,
    rest: Vec<(&'static str, Value)>,
}

impl JsonFields {
    fn push(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => self.message = Some(value.as_str().map_or_else(|| value.to_string(), str::to_owned)),
            "timestamp" | "level" | "component" => {}
            name => self.rest.push((name, value)),
        }
    }
}

impl Visit for JsonFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, Value::from(format!("{value:?}")));
    }
}

/// Errors that can occur while initializing the logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("validate options: level is required")]
    MissingLevel,

    #[error("validate options: {0}")]
    InvalidLevel(#[from] InvalidLevelError),

    #[error("logger already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Logger options.
#[derive(Clone)]
pub struct LoggerOptions {
    level: String,
    production_mode: bool,
    clock: Arc<dyn Clock>,
}

impl LoggerOptions {
    /// Options with a mandatory level token and development output.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            production_mode: false,
            clock: Arc::new(SystemClock),
        }
    }

    /// JSON output when `true`, colored console output otherwise.
    pub fn with_production_mode(mut self, production_mode: bool) -> Self {
        self.production_mode = production_mode;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn production_mode(&self) -> bool {
        self.production_mode
    }

    /// Check the options and return the parsed initial level.
    pub fn validate(&self) -> Result<Level, LoggerError> {
        if self.level.trim().is_empty() {
            return Err(LoggerError::MissingLevel);
        }
        Ok(self.level.trim().parse()?)
    }
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("level", &self.level)
            .field("production_mode", &self.production_mode)
            .finish_non_exhaustive()
    }
}

/// Flushes stdout when dropped. Hold it for the life of `main`.
#[must_use = "dropping the guard flushes immediately"]
#[derive(Debug)]
pub struct FlushGuard {
    _priv: (),
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        sync();
    }
}

/// Initialize the global logger.
///
/// Stores the configured level into `level` and installs a subscriber that
/// consults `level` on every record. Fails if the options are invalid (the
/// cell is then left untouched) or if a global subscriber already exists.
pub fn init(options: &LoggerOptions, level: &AtomicLevel) -> Result<FlushGuard, LoggerError> {
    let initial = options.validate()?;
    level.store(initial);

    let subscriber = build_subscriber(options, level, io::stdout);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(FlushGuard { _priv: () })
}

/// Build (without installing) the subscriber `init` would install, writing
/// to `writer`.
pub fn build_subscriber<W>(
    options: &LoggerOptions,
    level: &AtomicLevel,
    writer: W,
) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let json = options.production_mode.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(JsonFormat {
                clock: options.clock.clone(),
            })
            .with_writer(writer.clone())
            .with_filter(level_filter(level))
    });

    let console = (!options.production_mode).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_timer(ClockTimer(options.clock.clone()))
            .with_writer(writer)
            .with_filter(level_filter(level))
    });

    tracing_subscriber::registry().with(json).with(console)
}

fn level_filter(
    level: &AtomicLevel,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool + Clone + Send + Sync + 'static> {
    let level = level.clone();
    filter::filter_fn(move |meta| level.enabled_tracing(meta.level()))
}

/// Flush buffered log output.
///
/// Streams that do not support syncing (ttys, pipes in containers) are
/// ignored; any other failure is printed to stderr.
pub fn sync() {
    report_sync_error(io::stdout().flush(), &mut io::stderr());
}

fn report_sync_error(result: io::Result<()>, sink: &mut dyn Write) {
    if let Err(e) = result {
        if !is_unsupported(&e) {
            let _ = writeln!(sink, "cannot sync logger: {e}");
        }
    }
}

fn is_unsupported(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Unsupported
        || matches!(e.raw_os_error(), Some(libc::ENOTTY) | Some(libc::EINVAL))
}
