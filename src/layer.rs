//! A `tracing-subscriber` layer that writes each event as one log line.
use std::fmt;
use std::io;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::error::Result;
use crate::line::{is_reserved_key, write_line, write_line_numeric_coercion, LogLine, Timestamp};
use crate::severity::Severity;
use crate::timestamp::{Instant, MinuteCache};
use crate::trace::{TraceContext, Tracer};

/// Event field holding the raw `X-Cloud-Trace-Context` header value.
pub const TRACE_FIELD: &str = "trace";

/// How the layer timestamps each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `"time"` as RFC3339 with fixed nanoseconds, through a [`MinuteCache`].
    #[default]
    Rfc3339Cached,
    /// `"time"` as RFC3339 with fixed nanoseconds.
    Rfc3339,
    /// `"time"` as `seconds.nanos`.
    TimeUnixNanos,
    /// `"timestamp":{"seconds":..,"nanos":..}`
    TimestampStruct,
    /// `"timestampSeconds"` and `"timestampNanos"`.
    TimestampSplit,
    /// No timestamp; the agent uses the time it read the line.
    None,
}

/// Layer configuration.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Google Cloud project used to build trace names. Without it, the
    /// `trace` field of events is ignored.
    pub project_id: Option<String>,
    /// Timestamp representation of each line.
    pub time_format: TimeFormat,
    /// Write decimal string values as bare numbers.
    pub numeric_coercion: bool,
}

impl Config {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Writes tracing events as Cloud Logging JSON lines.
///
/// Lines go to stderr unless another writer is set with
/// [`LogLineLayer::with_writer`].
pub struct LogLineLayer<W = fn() -> io::Stderr> {
    tracer: Tracer,
    time_format: TimeFormat,
    numeric_coercion: bool,
    cache: Mutex<MinuteCache>,
    make_writer: W,
}

impl LogLineLayer {
    /// Create a layer writing to stderr.
    ///
    /// # Arguments
    /// * `config` - Project id, timestamp format and coercion setting
    ///
    /// # Returns
    /// The configured layer
    pub fn new(config: Config) -> Self {
        Self {
            tracer: Tracer::new(config.project_id.unwrap_or_default()),
            time_format: config.time_format,
            numeric_coercion: config.numeric_coercion,
            cache: Mutex::new(MinuteCache::new()),
            make_writer: io::stderr,
        }
    }
}

impl<W> LogLineLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    /// Replace the sink lines are written to.
    pub fn with_writer<W2>(self, make_writer: W2) -> LogLineLayer<W2>
    where
        W2: for<'a> MakeWriter<'a> + 'static,
    {
        LogLineLayer {
            tracer: self.tracer,
            time_format: self.time_format,
            numeric_coercion: self.numeric_coercion,
            cache: self.cache,
            make_writer,
        }
    }

    fn timestamp(&self, now: Instant) -> Option<Timestamp> {
        match self.time_format {
            TimeFormat::Rfc3339Cached => {
                let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
                Some(Timestamp::Time(cache.format_rfc3339(now)))
            }
            TimeFormat::Rfc3339 => Some(Timestamp::time_rfc3339(now)),
            TimeFormat::TimeUnixNanos => Some(Timestamp::time_unix_nanos(now)),
            TimeFormat::TimestampStruct => Some(Timestamp::structured(now)),
            TimeFormat::TimestampSplit => Some(Timestamp::split(now)),
            TimeFormat::None => None,
        }
    }

    fn build_line(&self, event: &Event<'_>, now: Instant) -> LogLine {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = LogLine::new(Severity::from(event.metadata().level()), visitor.message);
        line.timestamp = self.timestamp(now);
        line.field = visitor.field;

        if let Some(header) = visitor.trace {
            line.trace = self.tracer.trace_name(&header);
            if line.trace.is_some() {
                line.span_id = TraceContext::parse(&header)
                    .and_then(|context| context.span_id)
                    .map(str::to_owned);
            }
        }
        line
    }
}

impl<S, W> Layer<S> for LogLineLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    /// Encode the event and write it to the configured sink
    ///
    /// # Arguments
    /// * `event` - The log event to process
    /// * `_ctx` - The tracing context
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = self.build_line(event, Instant::now());

        let mut writer = self.make_writer.make_writer_for(event.metadata());
        let result = if self.numeric_coercion {
            write_line_numeric_coercion(&mut writer, &line)
        } else {
            write_line(&mut writer, &line)
        };
        if let Err(e) = result {
            eprintln!("Failed to write log line: {}", e);
        }
    }
}

/// Collects the parts of an event that end up in the line.
#[derive(Default)]
struct LineVisitor {
    message: String,
    trace: Option<String>,
    /// First integer field of the event whose name is not a reserved key.
    field: Option<(String, i64)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_owned(),
            TRACE_FIELD => self.trace = Some(value.to_owned()),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if self.field.is_none() && !is_reserved_key(field.name()) {
            self.field = Some((field.name().to_owned(), value));
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if let Ok(value) = i64::try_from(value) {
            self.record_i64(field, value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            TRACE_FIELD => self.trace = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}
