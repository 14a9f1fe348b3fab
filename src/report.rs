//! Log export
//!
//! Plain-text report, one line per entry as `[time] KIND   detail` with the
//! kind padded to six columns, and a JSON snapshot of the full monitor state.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::detector::WarningState;
use crate::error::MonitorError;
use crate::types::{ActivityStats, LogEntry};

/// Read-only copy of everything the monitor knows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub stats: ActivityStats,
    pub warning: WarningState,
    pub entries: Vec<LogEntry>,
}

impl MonitorSnapshot {
    pub fn to_json(&self) -> Result<String, MonitorError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, MonitorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format a single report line
pub fn format_line(entry: &LogEntry) -> String {
    format!("[{}] {:<6} {}", entry.formatted_time, entry.kind, entry.detail)
}

/// Render the full log, lines joined by `\n` with no trailing newline.
///
/// An empty log has nothing to export and yields [`MonitorError::EmptyLog`].
pub fn format_report(entries: &[LogEntry]) -> Result<String, MonitorError> {
    if entries.is_empty() {
        return Err(MonitorError::EmptyLog);
    }

    Ok(entries
        .iter()
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Suggested download name, `activity-log-YYYY-MM-DD_HH-MM.txt`
pub fn report_file_name(now: DateTime<FixedOffset>) -> String {
    format!("activity-log-{}.txt", now.format("%Y-%m-%d_%H-%M"))
}

/// [`report_file_name`] for an epoch-millisecond timestamp
pub fn report_file_name_at(timestamp_ms: i64, offset: FixedOffset) -> String {
    report_file_name(clock::to_datetime(timestamp_ms, offset))
}
