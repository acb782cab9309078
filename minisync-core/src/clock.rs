//! Calendar-precision logical clock.
//!
//! A [`LogicalClock`] mirrors a broken-down local time: years are counted from
//! 1900 and months from zero. Ordering and equality look at
//! `(year, month, day, hours, minutes, seconds)` only; `weekday`, `year_day`
//! and `dst` ride along for display and are never compared.
//!
//! # Transport
//!
//! [`LogicalClock::encode`] produces JSON wrapped in URL-safe base64 without
//! padding. That alphabet has no quotes, whitespace or newlines, so the
//! result can be dropped into a single-quoted remote shell command as-is.

use std::cmp::Ordering;
use std::fmt;
use std::time::SystemTime;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ClockError;

/// Base year of the `year` field.
pub const YEAR_BASE: i32 = 1900;

/// Broken-down timestamp used as the sole basis for staleness decisions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalClock {
    pub seconds: i32,
    pub minutes: i32,
    pub hours: i32,
    /// Day of month, 1-based.
    pub day: i32,
    /// Month, 0-based.
    pub month: i32,
    /// Years since [`YEAR_BASE`].
    pub year: i32,
    /// Days since Sunday.
    pub weekday: i32,
    /// Days since January 1st.
    pub year_day: i32,
    /// Positive when daylight saving time is in effect.
    pub dst: i32,
}

impl LogicalClock {
    /// Capture the current local wall-clock time.
    pub fn from_now() -> Self {
        Self::from_local(&Local::now())
    }

    /// Convert a file modification timestamp to local broken-down time.
    pub fn from_modification_time(time: SystemTime) -> Self {
        Self::from_local(&DateTime::<Local>::from(time))
    }

    /// Build a clock from calendar values (`month` 1–12).
    ///
    /// Returns `None` for dates or times that do not exist.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(|naive| Self::from_naive(&naive))
    }

    /// Broken-down form of a naive date-time; `dst` is always zero.
    pub fn from_naive(naive: &NaiveDateTime) -> Self {
        Self {
            seconds: naive.second() as i32,
            minutes: naive.minute() as i32,
            hours: naive.hour() as i32,
            day: naive.day() as i32,
            month: naive.month0() as i32,
            year: naive.year() - YEAR_BASE,
            weekday: naive.weekday().num_days_from_sunday() as i32,
            year_day: naive.ordinal0() as i32,
            dst: 0,
        }
    }

    fn from_local(now: &DateTime<Local>) -> Self {
        let mut clock = Self::from_naive(&now.naive_local());
        clock.dst = i32::from(observes_dst(now));
        clock
    }

    /// Calendar year, e.g. `2024`.
    pub fn calendar_year(&self) -> i32 {
        self.year + YEAR_BASE
    }

    /// Lexicographic comparison over `(year, month, day, hours, minutes, seconds)`.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }

    fn ordering_key(&self) -> [i32; 6] {
        [
            self.year,
            self.month,
            self.day,
            self.hours,
            self.minutes,
            self.seconds,
        ]
    }

    /// Transport-safe form: base64url (no padding) of the JSON document.
    pub fn encode(&self) -> String {
        // Serializing a struct of plain integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Inverse of [`encode`](Self::encode). Surrounding whitespace is ignored.
    pub fn decode(encoded: &str) -> Result<Self, ClockError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Single-line JSON, as printed by `report-time`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse the output of `report-time`.
    pub fn from_json(text: &str) -> Result<Self, ClockError> {
        Ok(serde_json::from_str(text.trim())?)
    }
}

/// Free-function form of [`LogicalClock::compare`].
pub fn compare(a: &LogicalClock, b: &LogicalClock) -> Ordering {
    a.compare(b)
}

impl PartialEq for LogicalClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for LogicalClock {}

impl PartialOrd for LogicalClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for LogicalClock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for LogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.calendar_year(),
            self.month + 1,
            self.day,
            self.hours,
            self.minutes,
            self.seconds
        )
    }
}

/// DST is in effect when the current offset is the larger of the January and
/// July offsets of the same year, and those two differ.
fn observes_dst(now: &DateTime<Local>) -> bool {
    let offset_on = |month: u32| {
        Local
            .with_ymd_and_hms(now.year(), month, 1, 12, 0, 0)
            .single()
            .map(|dt| dt.offset().local_minus_utc())
    };
    match (offset_on(1), offset_on(7)) {
        (Some(january), Some(july)) if january != july => {
            now.offset().local_minus_utc() == january.max(july)
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
