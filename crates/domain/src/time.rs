//! Time and timestamp helpers, including the casting time window.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used for activation times, cast times, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A daily time-of-day window during which casting is allowed.
///
/// The window is half-open: `start` is included, `end` is excluded.
/// When `end < start` the window wraps past midnight (e.g. 22:00–02:00
/// covers 23:30 and 01:00 but not 10:00). A window with `start == end`
/// contains no instant at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Create a window from two times of day.
    #[must_use]
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a window from two `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTime`] when either string is not
    /// a valid `HH:MM` time of day.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        })
    }

    /// Whether `now` falls inside the window, handling the wrap past
    /// midnight.
    #[must_use]
    pub fn contains(&self, now: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= now && now < self.end
        } else {
            now >= self.start || now < self.end
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Parse a single `HH:MM` time of day.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTime`] for anything that is not a
/// valid 24-hour `HH:MM` string.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn should_contain_times_strictly_inside_same_day_window() {
        let w = TimeWindow::parse("07:00", "12:00").unwrap();
        assert!(w.contains(t(7, 0)));
        assert!(w.contains(t(8, 0)));
        assert!(w.contains(t(11, 59)));
    }

    #[test]
    fn should_exclude_end_of_same_day_window() {
        let w = TimeWindow::parse("07:00", "12:00").unwrap();
        assert!(!w.contains(t(12, 0)));
        assert!(!w.contains(t(6, 59)));
        assert!(!w.contains(t(23, 0)));
    }

    #[test]
    fn should_wrap_past_midnight_when_end_before_start() {
        let w = TimeWindow::parse("22:00", "02:00").unwrap();
        assert!(w.contains(t(23, 30)));
        assert!(w.contains(t(1, 0)));
        assert!(w.contains(t(22, 0)));
        assert!(!w.contains(t(10, 0)));
        assert!(!w.contains(t(2, 0)));
    }

    #[test]
    fn should_contain_nothing_when_start_equals_end() {
        let w = TimeWindow::parse("09:00", "09:00").unwrap();
        assert!(!w.contains(t(9, 0)));
        assert!(!w.contains(t(12, 0)));
        assert!(!w.contains(t(0, 0)));
    }

    #[test]
    fn should_reject_malformed_time_strings() {
        assert_eq!(
            TimeWindow::parse("7 o'clock", "12:00"),
            Err(ValidationError::InvalidTime("7 o'clock".to_string()))
        );
        assert!(TimeWindow::parse("07:00", "25:61").is_err());
        assert!(TimeWindow::parse("", "12:00").is_err());
    }

    #[test]
    fn should_display_window_as_hhmm_range() {
        let w = TimeWindow::parse("22:00", "02:00").unwrap();
        assert_eq!(w.to_string(), "22:00-02:00");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let w = TimeWindow::parse("07:30", "23:45").unwrap();
        let json = serde_json::to_string(&w).unwrap();
        let parsed: TimeWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, w);
    }
}
