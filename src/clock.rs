//! Timestamp source and time formatting

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Source of wall-clock milliseconds for events the monitor stamps itself
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock advanced by hand, for replays and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Convert epoch milliseconds to a datetime in `offset`.
///
/// Out-of-range values fall back to the epoch rather than panicking.
pub fn to_datetime(timestamp_ms: i64, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_default();
    utc.with_timezone(&offset)
}

/// Format as 24h `HH:MM:SS.mmm`
pub fn format_time(timestamp_ms: i64, offset: FixedOffset) -> String {
    to_datetime(timestamp_ms, offset)
        .format("%H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_format_time_millis() {
        // 2024-01-15T14:05:09.042Z
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 15, 14, 5, 9)
            .unwrap()
            .timestamp_millis()
            + 42;
        assert_eq!(format_time(ts, utc()), "14:05:09.042");
    }

    #[test]
    fn test_format_time_offset() {
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 15, 23, 30, 0)
            .unwrap()
            .timestamp_millis();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_time(ts, plus_two), "01:30:00.000");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 1_250);
        clock.set(0);
        assert_eq!(clock.now_ms(), 0);
    }
}
