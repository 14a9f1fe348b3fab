//! Core data types
//!
//! Events flow in as [`InteractionEvent`]s, are recorded as [`LogEntry`]s, and
//! the aggregate state is reported through [`ActivityStats`] and
//! [`WarningState`](crate::detector::WarningState).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of interaction observed by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Click,
    Key,
    Focus,
    Blur,
    /// Monitor lifecycle messages, not user input
    System,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "CLICK",
            EventKind::Key => "KEY",
            EventKind::Focus => "FOCUS",
            EventKind::Blur => "BLUR",
            EventKind::System => "SYSTEM",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width/alignment flags apply, the report relies on `{:<6}`
        f.pad(self.as_str())
    }
}

/// A single classified user interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: EventKind,
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Human readable description (target element, key chord, ...)
    #[serde(default)]
    pub detail: String,
}

impl InteractionEvent {
    pub fn new(kind: EventKind, timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp_ms,
            detail: detail.into(),
        }
    }

    pub fn click(timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self::new(EventKind::Click, timestamp_ms, detail)
    }

    pub fn key(timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self::new(EventKind::Key, timestamp_ms, detail)
    }

    pub fn focus(timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self::new(EventKind::Focus, timestamp_ms, detail)
    }

    pub fn blur(timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self::new(EventKind::Blur, timestamp_ms, detail)
    }

    pub fn system(timestamp_ms: i64, detail: impl Into<String>) -> Self {
        Self::new(EventKind::System, timestamp_ms, detail)
    }
}

/// Immutable record appended to the activity log on every ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp_ms: i64,
    pub kind: EventKind,
    pub detail: String,
    /// `HH:MM:SS.mmm`, fixed when the entry was created
    pub formatted_time: String,
}

/// Cumulative interaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub clicks: u64,
    pub keys: u64,
    /// Focus and blur events both count here
    pub focus: u64,
}

impl Counters {
    /// Increment the counter matching `kind`. System events count nowhere.
    pub fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Click => self.clicks += 1,
            EventKind::Key => self.keys += 1,
            EventKind::Focus | EventKind::Blur => self.focus += 1,
            EventKind::System => {}
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Counter snapshot plus the score derived from it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub clicks: u64,
    pub keys: u64,
    pub focus: u64,
    pub score: u32,
}

impl ActivityStats {
    pub fn from_counters(counters: &Counters, score: u32) -> Self {
        Self {
            clicks: counters.clicks,
            keys: counters.keys,
            focus: counters.focus,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_and_blur_share_counter() {
        let mut counters = Counters::default();
        counters.record(EventKind::Focus);
        counters.record(EventKind::Blur);
        counters.record(EventKind::Click);
        counters.record(EventKind::System);

        assert_eq!(counters.focus, 2);
        assert_eq!(counters.clicks, 1);
        assert_eq!(counters.keys, 0);
    }

    #[test]
    fn test_kind_display_respects_padding() {
        assert_eq!(format!("{:<6}|", EventKind::Key), "KEY   |");
        assert_eq!(format!("{:<6}|", EventKind::System), "SYSTEM|");
    }

    #[test]
    fn test_kind_serializes_upper_case() {
        let event = InteractionEvent::blur(10, "element: search");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"BLUR\""));

        let back: InteractionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
