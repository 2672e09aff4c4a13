//! Timestamp encodings understood by the Cloud Logging agent.
//!
//! Three textual forms are produced:
//! * `1550948234.358873000`: unix seconds with fixed-width nanoseconds
//! * `2019-02-23T18:57:14.358873000Z`: RFC3339 in UTC with fixed-width nanoseconds
//! * the same RFC3339 form, produced through a [`MinuteCache`] that reuses the
//!   `YYYY-MM-DDTHH:MM:` prefix while successive calls stay inside one minute
//!
//! Every formatter normalizes to UTC first, so the zone an [`Instant`] was
//! built from never shows up in the output.
use std::cell::RefCell;
use std::fmt::Write;
use std::time::SystemTime;

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

/// Number of nanoseconds in one second.
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Length of `YYYY-MM-DDTHH:MM:`, the part of the RFC3339 form shared by a whole minute.
pub const MINUTE_PREFIX_LEN: usize = 17;

/// Length of `YYYY-MM-DDTHH:MM:SS.nnnnnnnnnZ` for four-digit years.
pub const RFC3339_FIXED_NANOS_LEN: usize = 30;

/// RFC3339 with exactly nine fractional digits and a literal `Z`.
const RFC3339_FIXED_NANOS: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// An absolute point in time, held in UTC.
///
/// The sub-second part is always below [`NANOS_PER_SECOND`]; chrono's
/// leap-second representation is folded into the last nanosecond of the
/// second when converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(DateTime<Utc>);

impl Instant {
    /// Build an instant from unix seconds and a nanosecond offset.
    ///
    /// # Arguments
    /// * `seconds` - Seconds since the unix epoch, negative before 1970
    /// * `nanos` - Nanoseconds within that second
    ///
    /// # Returns
    /// The instant, or an error if `nanos` is not below one second or the
    /// second cannot be represented as a calendar date
    pub fn new(seconds: i64, nanos: u32) -> Result<Self> {
        if nanos >= NANOS_PER_SECOND {
            return Err(Error::InvalidNanos(nanos));
        }
        DateTime::<Utc>::from_timestamp(seconds, nanos)
            .map(Self)
            .ok_or(Error::OutOfRange(seconds))
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Whole seconds since the unix epoch, floored for pre-epoch instants.
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Nanoseconds past [`Instant::unix_seconds`], in `[0, 999_999_999]`.
    pub fn nanos(&self) -> u32 {
        self.0.timestamp_subsec_nanos()
    }

    /// The instant as a chrono UTC date-time.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Instant {
    fn from(time: DateTime<Tz>) -> Self {
        let utc = time.with_timezone(&Utc);
        if utc.timestamp_subsec_nanos() < NANOS_PER_SECOND {
            return Self(utc);
        }
        Self(utc.with_nanosecond(NANOS_PER_SECOND - 1).unwrap_or(utc))
    }
}

impl From<SystemTime> for Instant {
    fn from(time: SystemTime) -> Self {
        Self::from(DateTime::<Utc>::from(time))
    }
}

/// Format `instant` as `<unix_seconds>.<nanoseconds>` with nine nanosecond digits.
///
/// # Arguments
/// * `instant` - The instant to format
///
/// # Returns
/// A string such as `1550948234.000000001`
pub fn format_unix_fixed_nanos(instant: Instant) -> String {
    // 20 digits for an i64 with sign, 1 for '.', 9 for nanos
    let mut out = String::with_capacity(30);
    append_unix_fixed_nanos(&mut out, instant);
    out
}

/// Append the [`format_unix_fixed_nanos`] form of `instant` to `buf`.
pub fn append_unix_fixed_nanos(buf: &mut String, instant: Instant) {
    write!(buf, "{}.{:09}", instant.unix_seconds(), instant.nanos())
        .unwrap_or_else(|_| unreachable!());
}

/// Format `instant` as RFC3339 in UTC with exactly nine fractional digits.
///
/// # Arguments
/// * `instant` - The instant to format
///
/// # Returns
/// A string such as `2019-02-23T18:57:14.358873000Z`
pub fn format_rfc3339_fixed_nanos(instant: Instant) -> String {
    let mut out = String::with_capacity(RFC3339_FIXED_NANOS_LEN);
    append_rfc3339_fixed_nanos(&mut out, instant);
    out
}

/// Append the [`format_rfc3339_fixed_nanos`] form of `instant` to `buf`.
pub fn append_rfc3339_fixed_nanos(buf: &mut String, instant: Instant) {
    write!(buf, "{}", instant.to_utc().format(RFC3339_FIXED_NANOS))
        .unwrap_or_else(|_| unreachable!());
}

/// Single-slot memo of the formatted minute for the RFC3339 encoding.
///
/// Log lines are usually written in bursts well under a minute apart, so most
/// calls only need the seconds and nanoseconds appended to the cached
/// `YYYY-MM-DDTHH:MM:` prefix instead of a full calendar conversion. The
/// output is byte-identical to [`format_rfc3339_fixed_nanos`].
///
/// Formatting mutates the cache, hence `&mut self`: share one behind a lock,
/// or keep one per thread as [`format_rfc3339_cached`] does.
#[derive(Debug, Clone, Default)]
pub struct MinuteCache {
    /// Unix seconds of the cached minute boundary.
    minute: Option<i64>,
    prefix: String,
}

impl MinuteCache {
    /// Create an empty cache; the first call always takes the full path.
    pub const fn new() -> Self {
        Self {
            minute: None,
            prefix: String::new(),
        }
    }

    /// Format `instant` as RFC3339 with nine fractional digits, reusing the
    /// cached minute prefix when possible.
    ///
    /// # Arguments
    /// * `instant` - The instant to format
    ///
    /// # Returns
    /// The same string [`format_rfc3339_fixed_nanos`] returns for `instant`
    pub fn format_rfc3339(&mut self, instant: Instant) -> String {
        let mut out = String::with_capacity(RFC3339_FIXED_NANOS_LEN);
        self.append_rfc3339(&mut out, instant);
        out
    }

    /// Append the cached RFC3339 form of `instant` to `buf`.
    pub fn append_rfc3339(&mut self, buf: &mut String, instant: Instant) {
        let seconds = instant.unix_seconds();
        let minute = seconds - seconds.rem_euclid(60);

        // The prefix is only trusted strictly after the boundary it was built from.
        let after_boundary = seconds > minute || instant.nanos() > 0;
        if self.minute == Some(minute) && after_boundary {
            buf.push_str(&self.prefix);
            write!(buf, "{:02}.{:09}Z", seconds - minute, instant.nanos())
                .unwrap_or_else(|_| unreachable!());
            return;
        }

        let start = buf.len();
        append_rfc3339_fixed_nanos(buf, instant);
        let formatted = &buf[start..];

        self.prefix.clear();
        // Years outside 0000..=9999 carry a sign and a wider field; leave them uncached.
        if formatted.len() == RFC3339_FIXED_NANOS_LEN {
            self.prefix.push_str(&formatted[..MINUTE_PREFIX_LEN]);
            self.minute = Some(minute);
        } else {
            self.minute = None;
        }
    }

    /// Unix seconds of the minute currently cached, if any.
    pub fn cached_minute(&self) -> Option<i64> {
        self.minute
    }

    /// The cached `YYYY-MM-DDTHH:MM:` prefix; empty when nothing is cached.
    pub fn cached_prefix(&self) -> &str {
        &self.prefix
    }

    /// Forget the cached minute.
    pub fn clear(&mut self) {
        self.minute = None;
        self.prefix.clear();
    }
}

thread_local! {
    static THREAD_CACHE: RefCell<MinuteCache> = const { RefCell::new(MinuteCache::new()) };
}

/// Format `instant` through a [`MinuteCache`] owned by the calling thread.
///
/// Each thread warms its own cache, so this is safe to call from anywhere.
pub fn format_rfc3339_cached(instant: Instant) -> String {
    THREAD_CACHE.with(|cache| cache.borrow_mut().format_rfc3339(instant))
}
