//! Query windows and UTC calendar-day helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive `[start_ms, end_ms]` window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Window {
    pub const fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Builds a window from two instants.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    /// Whether `timestamp_ms` falls inside the window, bounds included.
    pub const fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }

    /// Start later than end. Such windows produce no day buckets.
    pub const fn is_inverted(&self) -> bool {
        self.start_ms > self.end_ms
    }
}

/// Named ranges offered by the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Range {
    /// From UTC midnight today until now.
    Today,
    /// The trailing seven days until now.
    #[default]
    Week,
}

impl Range {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
        }
    }

    /// Resolves the range against a reference instant.
    pub fn window_at(self, now: DateTime<Utc>) -> Window {
        let start = match self {
            Self::Today => day_start(now.date_naive()),
            Self::Week => now - Duration::days(7),
        };
        Window::between(start, now)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            _ => Err(format!("invalid range: {s}")),
        }
    }
}

/// UTC calendar day containing `timestamp_ms`, if representable.
pub fn utc_day(timestamp_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.date_naive())
}

/// UTC midnight at the start of `day`.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// `YYYY-MM-DD` bucket key for a day.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn contains_is_inclusive() {
        let window = Window::new(10, 20);
        assert!(window.contains(10));
        assert!(window.contains(20));
        assert!(!window.contains(9));
        assert!(!window.contains(21));
    }

    #[test]
    fn today_starts_at_utc_midnight() {
        let now = at("2025-01-15T13:45:00Z");
        let window = Range::Today.window_at(now);
        assert_eq!(window.start_ms, at("2025-01-15T00:00:00Z").timestamp_millis());
        assert_eq!(window.end_ms, now.timestamp_millis());
    }

    #[test]
    fn week_spans_seven_days() {
        let now = at("2025-01-15T13:45:00Z");
        let window = Range::Week.window_at(now);
        assert_eq!(window.end_ms - window.start_ms, 7 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn range_parses() {
        assert_eq!("today".parse::<Range>().unwrap(), Range::Today);
        assert_eq!("week".parse::<Range>().unwrap(), Range::Week);
        assert!("month".parse::<Range>().is_err());
    }

    #[test]
    fn day_helpers_use_utc() {
        let ts = at("2025-01-15T23:59:00Z").timestamp_millis();
        let day = utc_day(ts).unwrap();
        assert_eq!(day_key(day), "2025-01-15");
        assert_eq!(day_start(day), at("2025-01-15T00:00:00Z"));
    }
}
