//! Structured logging on top of `tracing-subscriber`.
//!
//! [`Logging::init`] installs the process-wide subscriber once, after the
//! settings are resolved. Components get a named [`Logger`] from the
//! returned context; plain `tracing` macros keep working too and are
//! attributed to their module path.
//!
//! Each event becomes one record carrying `timestamp`, `level`, `logger`,
//! `message` and any extra fields, rendered as a JSON line or as a
//! console line depending on `LOG_FORMAT`.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::utils::time;
use serde::Serialize;
use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{self, Write as _};
use std::sync::{Arc, OnceLock};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Console,
}

impl LogFormat {
    /// Exactly `"json"` selects JSON output; anything else falls back to
    /// console.
    pub fn from_setting(raw: &str) -> Self {
        if raw == "json" {
            LogFormat::Json
        } else {
            LogFormat::Console
        }
    }
}

/// Parses an uppercase level name. Python's names are accepted, so
/// `WARNING` maps to `warn`, `CRITICAL` to `error` and `NOTSET` to `trace`.
/// Matching is case-sensitive.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level {
        "" => Err(Error::Logging("log level must not be empty".into())),
        "TRACE" | "NOTSET" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" | "WARNING" => Ok(LevelFilter::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(LevelFilter::ERROR),
        _ => Err(Error::Logging(format!("unrecognised log level: '{level}'"))),
    }
}

/// Handle to the installed logging setup.
#[derive(Debug, Clone)]
pub struct Logging {
    format: LogFormat,
    level: LevelFilter,
    installed: bool,
}

static LOGGING: OnceLock<Logging> = OnceLock::new();

impl Logging {
    /// Installs the global subscriber on first call. Later calls return the
    /// context created by the first one, whatever settings they pass.
    ///
    /// `RUST_LOG`, when set, refines the filter derived from `LOG_LEVEL`.
    pub fn init(settings: &Settings) -> Logging {
        LOGGING
            .get_or_init(|| {
                let filter = EnvFilter::builder()
                    .with_default_directive(settings.log_level.into())
                    .from_env_lossy();
                let installed = build(settings.log_format, filter, std::io::stdout)
                    .try_init()
                    .is_ok();
                Logging {
                    format: settings.log_format,
                    level: settings.log_level,
                    installed,
                }
            })
            .clone()
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// `false` when another global subscriber was already in place.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger::new(name)
    }
}

/// Builds a subscriber without installing it, for scoped use with
/// `tracing::subscriber::with_default`.
pub fn subscriber<W>(format: LogFormat, level: LevelFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");
    build(format, filter, writer)
}

fn build<W>(format: LogFormat, filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    match format {
        LogFormat::Json => Box::new(builder.event_format(JsonRecord).finish()),
        LogFormat::Console => Box::new(builder.event_format(ConsoleRecord).finish()),
    }
}

/// Extra key/value data attached to a [`Logger`] call.
#[derive(Debug, Clone, Default)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values that cannot be serialized are kept as their `Debug` text.
    pub fn with<V>(mut self, key: impl Into<String>, value: V) -> Self
    where
        V: Serialize + fmt::Debug,
    {
        let value = serde_json::to_value(&value).unwrap_or_else(|_| Value::String(format!("{:?}", value)));
        self.0.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("{}"),
        }
    }
}

/// A named logger. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
}

macro_rules! emit {
    ($level:expr, $name:expr, $message:expr, $fields:expr) => {
        tracing::event!(
            $level,
            logger = %$name,
            fields = %$fields,
            "{}",
            $message
        )
    };
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: &str, fields: Fields) {
        emit!(Level::DEBUG, self.name, message, fields);
    }

    pub fn info(&self, message: &str, fields: Fields) {
        emit!(Level::INFO, self.name, message, fields);
    }

    pub fn warning(&self, message: &str, fields: Fields) {
        emit!(Level::WARN, self.name, message, fields);
    }

    pub fn error(&self, message: &str, fields: Fields) {
        emit!(Level::ERROR, self.name, message, fields);
    }

    /// Error-level record carrying the error chain and, when
    /// `RUST_BACKTRACE` is enabled, the captured stack.
    pub fn exception(&self, message: &str, error: &(dyn std::error::Error + 'static), fields: Fields) {
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => backtrace.to_string(),
            _ => String::new(),
        };
        tracing::event!(
            Level::ERROR,
            logger = %self.name,
            fields = %fields,
            exception = %error_chain(error),
            stack = %stack,
            "{}",
            message
        );
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, ": {}", cause);
        source = cause.source();
    }
    out
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warning",
        _ => "error",
    }
}

#[derive(Default)]
struct Record {
    message: Option<String>,
    logger: Option<String>,
    exception: Option<String>,
    stack: Option<String>,
    fields: Map<String, Value>,
}

impl Record {
    fn put(&mut self, name: &str, value: Value) {
        match name {
            "message" => self.message = Some(value_text(value)),
            "logger" => self.logger = Some(value_text(value)),
            "exception" => self.exception = Some(value_text(value)),
            "stack" => {
                let text = value_text(value);
                if !text.is_empty() {
                    self.stack = Some(text);
                }
            }
            "fields" => {
                let extra = match &value {
                    Value::String(raw) => serde_json::from_str::<Map<String, Value>>(raw).ok(),
                    _ => None,
                };
                match extra {
                    Some(extra) => self.fields.extend(extra),
                    None => {
                        self.fields.insert(name.to_string(), value);
                    }
                }
            }
            // metadata injected by the `log` bridge
            n if n.starts_with("log.") => {}
            _ => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Visit for Record {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field.name(), Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field.name(), Value::String(value.to_string()));
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.exception = Some(error_chain(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field.name(), Value::String(format!("{:?}", value)));
    }
}

fn collect(event: &Event<'_>) -> Record {
    let mut record = Record::default();
    event.record(&mut record);
    record
}

/// One JSON object per line.
pub struct JsonRecord;

impl<S, N> FormatEvent<S, N> for JsonRecord
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let record = collect(event);

        let mut obj = Map::new();
        obj.insert("timestamp".into(), Value::String(time::now_iso8601()));
        obj.insert("level".into(), Value::String(level_name(meta.level()).into()));
        obj.insert(
            "logger".into(),
            Value::String(record.logger.unwrap_or_else(|| meta.target().to_string())),
        );
        obj.insert(
            "message".into(),
            Value::String(record.message.unwrap_or_default()),
        );
        if let Some(span) = ctx.lookup_current() {
            obj.insert("span".into(), Value::String(span.name().to_string()));
        }
        for (key, value) in record.fields {
            obj.entry(key).or_insert(value);
        }
        if let Some(exception) = record.exception {
            obj.insert("exception".into(), Value::String(exception));
        }
        if let Some(stack) = record.stack {
            obj.insert("stack".into(), Value::String(stack));
        }

        writeln!(writer, "{}", Value::Object(obj))
    }
}

/// Human-readable single line, with exception text on following lines.
pub struct ConsoleRecord;

impl<S, N> FormatEvent<S, N> for ConsoleRecord
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let record = collect(event);
        let logger = record.logger.unwrap_or_else(|| meta.target().to_string());

        write!(
            writer,
            "{} [{:<9}] {:<40} [{}]",
            time::now_iso8601(),
            level_name(meta.level()),
            record.message.unwrap_or_default(),
            logger
        )?;
        for (key, value) in &record.fields {
            match value {
                Value::String(s) => write!(writer, " {}={}", key, s)?,
                other => write!(writer, " {}={}", key, other)?,
            }
        }
        writeln!(writer)?;
        if let Some(exception) = record.exception {
            writeln!(writer, "  exception: {}", exception)?;
        }
        if let Some(stack) = record.stack {
            writeln!(writer, "{}", stack)?;
        }
        Ok(())
    }
}
