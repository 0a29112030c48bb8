//! Time parsing utilities.
//!
//! Schedule tables carry times either as bare clock times ("09:00",
//! "09:00:00") or as full timestamps ("2025-06-14 09:00"). All of them are
//! normalized to a `NaiveDateTime`; bare clock times share one anchor day so
//! they stay comparable with each other.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::EngineError;

/// Accepted clock-only formats, tried in order.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Accepted full-timestamp formats, tried in order.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a schedule time value. The first matching format wins; a value that
/// matches none of them is a fatal error for the whole analysis run.
pub fn parse_time(raw: &str) -> Result<NaiveDateTime, EngineError> {
  for fmt in TIME_FORMATS {
    if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
      // NaiveDate::default() is the epoch; any fixed day works, the rules
      // only ever look at differences.
      return Ok(NaiveDateTime::new(NaiveDate::default(), t));
    }
  }
  for fmt in DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
      return Ok(dt);
    }
  }
  Err(EngineError::time_parse(raw))
}

/// Signed minutes from `a` to `b` (negative when `b` precedes `a`).
pub fn minutes_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
  (b - a).num_seconds() as f64 / 60.0
}
