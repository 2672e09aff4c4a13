//! Error type shared by the formatters, the encoder and the layer.

use thiserror::Error;

/// Errors produced while building instants or encoding log lines.
///
/// None of these are transient: each one points at a caller bug (bad input,
/// missing severity mapping) or a broken sink.
#[derive(Debug, Error)]
pub enum Error {
    /// The sub-second part of an instant was not below one second.
    #[error("nanoseconds out of range: {0} (must be below 1000000000)")]
    InvalidNanos(u32),

    /// The second count cannot be represented as a calendar date.
    #[error("unix seconds out of range: {0}")]
    OutOfRange(i64),

    /// An integer level with no entry in the severity table.
    #[error("no severity for log level {0}")]
    UnknownLevel(i32),

    /// The record could not be serialized to JSON.
    #[error("failed to serialize log line: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the encoded line to its sink failed.
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
