//! Structured log lines for Google Cloud Logging.
//!
//! The logging agent on Google Cloud parses JSON lines written to
//! stdout/stderr and recognizes a few special fields. This crate produces
//! those lines: timestamp encodings the agent accepts (including a cached
//! RFC3339 formatter for the hot path), a [`LogLine`] record that serializes
//! to exactly one line with empty fields omitted, trace names built from the
//! `X-Cloud-Trace-Context` header, and a `tracing-subscriber` layer tying
//! them together.
//!
//! ```
//! use gcplogs::{encode_line, Instant, LogLine, Severity, Timestamp};
//!
//! let now = Instant::new(1550948234, 99999999).unwrap();
//! let line = LogLine::new(Severity::Warning, "disk nearly full")
//!     .with_timestamp(Timestamp::split(now));
//! assert_eq!(
//!     encode_line(&line).unwrap(),
//!     b"{\"severity\":\"WARNING\",\"message\":\"disk nearly full\",\"timestampSeconds\":1550948234,\"timestampNanos\":99999999}\n",
//! );
//! ```
pub mod error;
pub mod layer;
pub mod line;
pub mod severity;
pub mod timestamp;
pub mod trace;

pub use error::{Error, Result};
pub use layer::{Config, LogLineLayer, TimeFormat};
pub use line::{
    coerce_decimal_strings, encode_line, encode_line_numeric_coercion, is_reserved_key,
    write_line, write_line_numeric_coercion, LogLine, Timestamp, RESERVED_KEYS, SPAN_ID_KEY,
    TRACE_KEY,
};
pub use severity::Severity;
pub use timestamp::{
    format_rfc3339_cached, format_rfc3339_fixed_nanos, format_unix_fixed_nanos, Instant,
    MinuteCache,
};
pub use trace::{TraceContext, Tracer, TRACE_HEADER};
