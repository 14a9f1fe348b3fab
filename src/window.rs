//! Sliding time window over recent clicks
//!
//! Keeps click timestamps oldest-first and drops everything that falls more
//! than `window_ms` behind the newest click.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Length of the rapid-click window in milliseconds
pub const CLICK_WINDOW_MS: i64 = 5000;

/// Bounded queue of recent click timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickWindow {
    timestamps: VecDeque<i64>,
    window_ms: i64,
}

impl Default for ClickWindow {
    fn default() -> Self {
        Self::new(CLICK_WINDOW_MS)
    }
}

impl ClickWindow {
    pub fn new(window_ms: i64) -> Self {
        Self {
            timestamps: VecDeque::new(),
            window_ms,
        }
    }

    /// Push a click and evict entries older than `timestamp - window_ms`.
    ///
    /// Timestamps must be non-decreasing; an older timestamp is still pushed
    /// but cannot evict anything newer than itself.
    pub fn record_click(&mut self, timestamp_ms: i64) -> usize {
        self.timestamps.push_back(timestamp_ms);
        while let Some(&oldest) = self.timestamps.front() {
            if timestamp_ms.saturating_sub(oldest) > self.window_ms {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        self.timestamps.len()
    }

    /// Number of clicks retained after the most recent eviction
    pub fn current_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Count of retained clicks still inside the window as seen from `now_ms`.
    ///
    /// Does not mutate; eviction only happens on `record_click`.
    pub fn count_at(&self, now_ms: i64) -> usize {
        self.timestamps
            .iter()
            .filter(|&&t| now_ms.saturating_sub(t) <= self.window_ms)
            .count()
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn newest(&self) -> Option<i64> {
        self.timestamps.back().copied()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_within_window() {
        let mut window = ClickWindow::default();
        for i in 0..25 {
            window.record_click(i * 100);
        }
        assert_eq!(window.current_count(), 25);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut window = ClickWindow::default();
        window.record_click(0);
        window.record_click(5000);
        // exactly WINDOW_MS apart stays
        assert_eq!(window.current_count(), 2);

        window.record_click(5001);
        assert_eq!(window.current_count(), 2);
        assert_eq!(window.newest(), Some(5001));
    }

    #[test]
    fn test_evicts_expired_clicks() {
        let mut window = ClickWindow::default();
        window.record_click(0);
        window.record_click(1000);
        window.record_click(2000);

        let count = window.record_click(7500);
        // only 7500 and nothing else within 5s
        assert_eq!(count, 1);
    }

    #[test]
    fn test_never_exceeds_trailing_count() {
        let mut window = ClickWindow::default();
        let mut history = Vec::new();
        let mut ts = 0;
        for step in [10, 300, 4900, 1, 6000, 250, 250, 5000, 20, 70] {
            ts += step;
            history.push(ts);
            window.record_click(ts);
            let trailing = history.iter().filter(|&&t| ts - t <= CLICK_WINDOW_MS).count();
            assert!(window.current_count() <= trailing);
            assert_eq!(window.current_count(), trailing);
        }
    }

    #[test]
    fn test_count_at_does_not_mutate() {
        let mut window = ClickWindow::default();
        window.record_click(0);
        window.record_click(100);

        assert_eq!(window.count_at(6000), 0);
        assert_eq!(window.current_count(), 2);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut window = ClickWindow::default();
        assert_eq!(window.record_click(i64::MIN + 1), 1);
        assert_eq!(window.count_at(i64::MAX), 0);
        assert_eq!(window.record_click(i64::MAX), 1);
        assert_eq!(window.newest(), Some(i64::MAX));
    }

    #[test]
    fn test_clear() {
        let mut window = ClickWindow::new(1000);
        window.record_click(1);
        window.clear();
        assert_eq!(window.current_count(), 0);
        assert_eq!(window.newest(), None);
        assert_eq!(window.window_ms(), 1000);
    }
}
