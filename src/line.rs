//! Single-line JSON encoding of log records.
//!
//! The logging agent parses each line written to stdout/stderr as one JSON
//! object and lifts a few special fields out of it: `severity`, `message`,
//! the trace key and one of several timestamp shapes.
//! See <https://cloud.google.com/logging/docs/agent/configuration#special-fields>
use std::borrow::Cow;
use std::io::Write;
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::severity::Severity;
use crate::timestamp::{format_rfc3339_fixed_nanos, format_unix_fixed_nanos, Instant};

/// Log key for trace names.
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";

/// Log key for span ids.
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";

/// Keys written by [`LogLine`] itself. An extra field with one of these names
/// would duplicate the key, so it is never written.
pub const RESERVED_KEYS: [&str; 8] = [
    "severity",
    "message",
    TRACE_KEY,
    SPAN_ID_KEY,
    "timestamp",
    "timestampSeconds",
    "timestampNanos",
    "time",
];

/// Whether `key` is one of [`RESERVED_KEYS`].
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Where and how a line carries its timestamp. A line has at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// `"timestamp":{"seconds":S,"nanos":N}`
    Structured { seconds: i64, nanos: i32 },
    /// `"timestamp":"..."`
    String(String),
    /// `"timestampSeconds":S,"timestampNanos":N`
    Split { seconds: i64, nanos: i32 },
    /// `"time":"..."`
    Time(String),
}

impl Timestamp {
    /// `"timestamp"` as a nested `seconds`/`nanos` object.
    pub fn structured(instant: Instant) -> Self {
        Timestamp::Structured {
            seconds: instant.unix_seconds(),
            nanos: instant.nanos() as i32,
        }
    }

    /// `"timestampSeconds"` and `"timestampNanos"` as two integers.
    pub fn split(instant: Instant) -> Self {
        Timestamp::Split {
            seconds: instant.unix_seconds(),
            nanos: instant.nanos() as i32,
        }
    }

    /// `"timestamp"` as RFC3339 with fixed nanoseconds.
    pub fn rfc3339(instant: Instant) -> Self {
        Timestamp::String(format_rfc3339_fixed_nanos(instant))
    }

    /// `"timestamp"` as `seconds.nanos`.
    pub fn unix_nanos(instant: Instant) -> Self {
        Timestamp::String(format_unix_fixed_nanos(instant))
    }

    /// `"time"` as RFC3339 with fixed nanoseconds.
    pub fn time_rfc3339(instant: Instant) -> Self {
        Timestamp::Time(format_rfc3339_fixed_nanos(instant))
    }

    /// `"time"` as `seconds.nanos`.
    pub fn time_unix_nanos(instant: Instant) -> Self {
        Timestamp::Time(format_unix_fixed_nanos(instant))
    }
}

/// One structured log line.
///
/// Empty strings, `None` and zero integers are left out of the encoded JSON
/// rather than written as `null`, `""` or `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Severity of the line; always written.
    pub severity: Severity,
    /// Free text, written as `message`.
    pub message: String,
    /// Trace name, `projects/<project>/traces/<trace>`.
    pub trace: Option<String>,
    /// Span id within the trace.
    pub span_id: Option<String>,
    /// The single timestamp representation, if any.
    pub timestamp: Option<Timestamp>,
    /// An extra integer field, e.g. `("example_key", 42)`. Ignored when the
    /// key is one of [`RESERVED_KEYS`].
    pub field: Option<(String, i64)>,
}

impl LogLine {
    /// Create a line with only a severity and a message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            trace: None,
            span_id: None,
            timestamp: None,
            field: None,
        }
    }

    /// Set the trace name.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Set the span id.
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Set the timestamp, replacing any previous representation.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the extra integer field.
    pub fn with_field(mut self, key: impl Into<String>, value: i64) -> Self {
        self.field = Some((key.into(), value));
        self
    }
}

/// The nested `timestamp` object.
#[derive(Serialize)]
struct TimestampObject {
    #[serde(skip_serializing_if = "is_zero")]
    seconds: i64,
    #[serde(skip_serializing_if = "is_zero")]
    nanos: i32,
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Serialize for LogLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("severity", &self.severity)?;
        if !self.message.is_empty() {
            map.serialize_entry("message", &self.message)?;
        }
        if let Some(trace) = non_empty(&self.trace) {
            map.serialize_entry(TRACE_KEY, trace)?;
        }
        if let Some(span_id) = non_empty(&self.span_id) {
            map.serialize_entry(SPAN_ID_KEY, span_id)?;
        }

        match &self.timestamp {
            Some(Timestamp::Structured { seconds, nanos }) => {
                let object = TimestampObject {
                    seconds: *seconds,
                    nanos: *nanos,
                };
                map.serialize_entry("timestamp", &object)?;
            }
            Some(Timestamp::String(value)) if !value.is_empty() => {
                map.serialize_entry("timestamp", value)?;
            }
            Some(Timestamp::Split { seconds, nanos }) => {
                if *seconds != 0 {
                    map.serialize_entry("timestampSeconds", seconds)?;
                }
                if *nanos != 0 {
                    map.serialize_entry("timestampNanos", nanos)?;
                }
            }
            Some(Timestamp::Time(value)) if !value.is_empty() => {
                map.serialize_entry("time", value)?;
            }
            _ => {}
        }

        if let Some((key, value)) = &self.field {
            if *value != 0 && !is_reserved_key(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Serialize `line` as compact JSON followed by a single `\n`.
///
/// # Arguments
/// * `line` - The line to encode
///
/// # Returns
/// The encoded bytes. A serialization error here is a bug in the record
/// shape, not something to retry.
pub fn encode_line(line: &LogLine) -> Result<Vec<u8>> {
    let mut encoded = serde_json::to_vec(line)?;
    encoded.push(b'\n');
    Ok(encoded)
}

// `:"` only occurs in compact JSON where a string value starts; quotes inside
// strings are always escaped.
static DECIMAL_STRING_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#":"([0-9]+\.[0-9]+)""#).expect("decimal string pattern is valid")
});

/// Rewrite every string value that is entirely `digits.digits` into a bare
/// JSON number, e.g. `{"time":"1550948234.358873"}` becomes
/// `{"time":1550948234.358873}`.
///
/// This is a textual pass over compact JSON such as [`encode_line`] produces.
/// Decimal-looking text inside a longer string is left alone.
pub fn coerce_decimal_strings(encoded: &[u8]) -> Cow<'_, [u8]> {
    DECIMAL_STRING_VALUE.replace_all(encoded, &b":$1"[..])
}

/// Like [`encode_line`], but with decimal string values turned into numbers
/// by [`coerce_decimal_strings`].
pub fn encode_line_numeric_coercion(line: &LogLine) -> Result<Vec<u8>> {
    let encoded = encode_line(line)?;
    Ok(coerce_decimal_strings(&encoded).into_owned())
}

/// Encode `line` with [`encode_line`] and write it to `writer`.
pub fn write_line<W: Write + ?Sized>(writer: &mut W, line: &LogLine) -> Result<()> {
    writer.write_all(&encode_line(line)?)?;
    Ok(())
}

/// Encode `line` with [`encode_line_numeric_coercion`] and write it to `writer`.
pub fn write_line_numeric_coercion<W: Write + ?Sized>(writer: &mut W, line: &LogLine) -> Result<()> {
    writer.write_all(&encode_line_numeric_coercion(line)?)?;
    Ok(())
}
