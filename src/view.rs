//! Bounded display model
//!
//! The activity log itself is never truncated. A view only keeps what a
//! screen would show: the newest entries first, capped at a display limit,
//! plus the latest stats and the visible warning.

use std::collections::VecDeque;

use crate::config::MonitorConfig;
use crate::detector::WarningState;
use crate::logger::MonitorObserver;
use crate::types::{ActivityStats, LogEntry};

/// Entries kept for display by default
pub const DISPLAY_LIMIT: usize = 300;

/// Newest-first window onto the activity log
#[derive(Debug, Clone)]
pub struct LogView {
    entries: VecDeque<LogEntry>,
    limit: usize,
    stats: ActivityStats,
    warning: Option<String>,
}

impl Default for LogView {
    fn default() -> Self {
        Self::new(DISPLAY_LIMIT)
    }
}

impl LogView {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(DISPLAY_LIMIT)),
            limit,
            stats: ActivityStats::default(),
            warning: None,
        }
    }

    /// View capped at the configured `display_limit`
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.display_limit)
    }

    /// Displayed entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> ActivityStats {
        self.stats
    }

    /// Message of the visible warning, if any
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Render displayed entries as `[time] KIND → detail`, newest first
    pub fn render_lines(&self) -> Vec<String> {
        self.entries.iter().map(render_entry).collect()
    }
}

/// Single display line; the arrow is omitted when there is no detail
pub fn render_entry(entry: &LogEntry) -> String {
    if entry.detail.is_empty() {
        format!("[{}] {}", entry.formatted_time, entry.kind)
    } else {
        format!("[{}] {} → {}", entry.formatted_time, entry.kind, entry.detail)
    }
}

impl MonitorObserver for LogView {
    fn on_log_entry_added(&mut self, entry: &LogEntry) {
        self.entries.push_front(entry.clone());
        while self.entries.len() > self.limit {
            self.entries.pop_back();
        }
    }

    fn on_stats_updated(&mut self, stats: &ActivityStats) {
        self.stats = *stats;
    }

    fn on_warning_changed(&mut self, state: &WarningState) {
        self.warning = state.active.then(|| state.message.clone());
    }

    fn on_reset(&mut self) {
        self.entries.clear();
        self.warning = None;
    }
}
