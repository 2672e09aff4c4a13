//! The Cloud Logging severity levels.
//! See <https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#LogSeverity>
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Lowest integer level accepted by [`Severity::from_level`].
pub const MIN_LEVEL: i32 = 0;
/// Highest integer level accepted by [`Severity::from_level`].
pub const MAX_LEVEL: i32 = 6;

/// Severity of a log line, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Debug or trace information.
    Debug,
    /// Routine information, such as ongoing status or performance.
    Info,
    /// Events that might cause problems.
    Warning,
    /// Events that are likely to cause problems.
    Error,
    /// Events that cause more severe problems or outages.
    Critical,
    /// A person must take an action immediately.
    Alert,
    /// One or more systems are unusable.
    Emergency,
}

// Indexed by `level - MIN_LEVEL`; a new level needs a new row here.
const LEVEL_SEVERITY: [Severity; (MAX_LEVEL - MIN_LEVEL + 1) as usize] = [
    Severity::Debug,
    Severity::Info,
    Severity::Warning,
    Severity::Error,
    Severity::Critical,
    Severity::Alert,
    Severity::Emergency,
];

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Severity; 7] = LEVEL_SEVERITY;

    /// Look up the severity for an integer log level.
    ///
    /// # Arguments
    /// * `level` - A level in `MIN_LEVEL..=MAX_LEVEL`
    ///
    /// # Returns
    /// The matching severity, or `Error::UnknownLevel` for anything outside
    /// the table. There is no fallback level.
    pub fn from_level(level: i32) -> Result<Self> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(Error::UnknownLevel(level));
        }
        Ok(LEVEL_SEVERITY[(level - MIN_LEVEL) as usize])
    }

    /// The integer level of this severity; inverse of [`Severity::from_level`].
    pub fn level(self) -> i32 {
        MIN_LEVEL + self as i32
    }

    /// The literal the logging agent expects in the `severity` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }
}

impl From<&tracing::Level> for Severity {
    /// Map a tracing level onto the closest severity. `TRACE` has no
    /// counterpart and is reported as DEBUG.
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::TRACE => Severity::Debug,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
