//! Activity logger
//!
//! The orchestrating core. Each ingested event is appended to the log,
//! counted, scored, fed to the click window when it is a click, and checked
//! against the detector. Observers are notified synchronously once the state
//! for that event is complete.
//!
//! Ingestion is strictly sequential: every mutation takes `&mut self`, so a
//! host sharing a logger across threads has to serialize access itself.

use chrono::FixedOffset;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::clock::{self, Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::detector::{ExpiryToken, SuspicionDetector, WarningSignal, WarningState};
use crate::error::MonitorError;
use crate::report::{self, MonitorSnapshot};
use crate::scoring::compute_score;
use crate::types::{ActivityStats, Counters, EventKind, InteractionEvent, LogEntry};
use crate::window::ClickWindow;

/// Detail of the entry written by [`ActivityLogger::start`]
pub const STARTED_MESSAGE: &str = "Activity monitor started";

/// Receives state changes from an [`ActivityLogger`].
///
/// All callbacks run inside `ingest`/`reset` and default to no-ops.
pub trait MonitorObserver {
    fn on_log_entry_added(&mut self, _entry: &LogEntry) {}

    fn on_stats_updated(&mut self, _stats: &ActivityStats) {}

    fn on_warning_changed(&mut self, _state: &WarningState) {}

    fn on_reset(&mut self) {}
}

impl<T: MonitorObserver + ?Sized> MonitorObserver for Rc<RefCell<T>> {
    fn on_log_entry_added(&mut self, entry: &LogEntry) {
        self.borrow_mut().on_log_entry_added(entry);
    }

    fn on_stats_updated(&mut self, stats: &ActivityStats) {
        self.borrow_mut().on_stats_updated(stats);
    }

    fn on_warning_changed(&mut self, state: &WarningState) {
        self.borrow_mut().on_warning_changed(state);
    }

    fn on_reset(&mut self) {
        self.borrow_mut().on_reset();
    }
}

/// What a single ingestion produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub stats: ActivityStats,
    /// Clicks inside the window as of this event
    pub window_count: usize,
    /// Signals applied to the warning slot, in order
    pub signals: Vec<WarningSignal>,
    /// Token of the expiry scheduled by this event, if a warning was raised
    pub expiry: Option<ExpiryToken>,
}

/// Owned monitor state with an explicit lifecycle:
/// construct, `ingest`*, `reset`, `dispose`.
pub struct ActivityLogger<C: Clock = SystemClock> {
    clock: C,
    offset: FixedOffset,
    log: Vec<LogEntry>,
    counters: Counters,
    score: u32,
    window: ClickWindow,
    detector: SuspicionDetector,
    warning: WarningState,
    last_timestamp_ms: Option<i64>,
    observers: Vec<Box<dyn MonitorObserver>>,
}

impl Default for ActivityLogger<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLogger<SystemClock> {
    /// Logger on the system clock with default thresholds
    pub fn new() -> Self {
        Self::with_clock(MonitorConfig::default(), SystemClock)
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ActivityLogger<C> {
    pub fn with_clock(config: MonitorConfig, clock: C) -> Self {
        Self {
            clock,
            offset: config.utc_offset(),
            log: Vec::new(),
            counters: Counters::default(),
            score: 0,
            window: ClickWindow::new(config.click_window_ms),
            detector: SuspicionDetector::from_config(&config),
            warning: WarningState::new(config.warning_ttl_ms),
            last_timestamp_ms: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Observers are called in registration order.
    pub fn subscribe(&mut self, observer: Box<dyn MonitorObserver>) {
        self.observers.push(observer);
    }

    /// Record the start-up entry at the clock's current time
    pub fn start(&mut self) -> IngestOutcome {
        let now_ms = self.clock.now_ms();
        self.start_at(now_ms)
    }

    /// Record the start-up entry on the host's own timeline.
    ///
    /// Hosts whose timestamps are not wall-clock (relative, replayed or
    /// queued) start at their first event so later events are not clamped.
    pub fn start_at(&mut self, timestamp_ms: i64) -> IngestOutcome {
        info!(timestamp_ms, "Activity monitor started");
        self.ingest(InteractionEvent::system(timestamp_ms, STARTED_MESSAGE))
    }

    /// Build an event stamped with the logger's clock and ingest it
    pub fn record(&mut self, kind: EventKind, detail: impl Into<String>) -> IngestOutcome {
        let event = InteractionEvent::new(kind, self.clock.now_ms(), detail);
        self.ingest(event)
    }

    /// Ingest one classified event. Never fails.
    pub fn ingest(&mut self, event: InteractionEvent) -> IngestOutcome {
        let timestamp_ms = self.clamp_timestamp(event.timestamp_ms);
        let event = InteractionEvent {
            timestamp_ms,
            ..event
        };

        let mut warning_changed = self.warning.expire_due(timestamp_ms);

        self.log.push(LogEntry {
            timestamp_ms,
            kind: event.kind,
            detail: event.detail.clone(),
            formatted_time: clock::format_time(timestamp_ms, self.offset),
        });

        self.counters.record(event.kind);
        self.score = compute_score(
            self.counters.clicks,
            self.counters.keys,
            self.counters.focus,
        );

        let window_count = if event.kind == EventKind::Click {
            self.window.record_click(timestamp_ms)
        } else {
            self.window.count_at(timestamp_ms)
        };

        let signals = self.detector.evaluate(&event, window_count, self.score);
        let mut expiry = None;
        for signal in &signals {
            info!(kind = ?signal.kind, "{}", signal.message);
            expiry = Some(self.warning.raise(signal.clone(), timestamp_ms));
            warning_changed = true;
        }

        let stats = self.stats();
        debug!(
            kind = %event.kind,
            timestamp_ms,
            window_count,
            score = stats.score,
            "ingested interaction"
        );

        if let Some(entry) = self.log.last() {
            for observer in self.observers.iter_mut() {
                observer.on_log_entry_added(entry);
            }
        }
        for observer in self.observers.iter_mut() {
            observer.on_stats_updated(&stats);
        }
        if warning_changed {
            self.notify_warning();
        }

        IngestOutcome {
            stats,
            window_count,
            signals,
            expiry,
        }
    }

    /// Clear log, counters, click window and warning. Idempotent.
    pub fn reset(&mut self) {
        self.log.clear();
        self.counters.clear();
        self.score = 0;
        self.window.clear();
        self.last_timestamp_ms = None;
        let warning_changed = self.warning.clear();

        info!("Activity monitor reset");

        let stats = self.stats();
        for observer in self.observers.iter_mut() {
            observer.on_reset();
            observer.on_stats_updated(&stats);
        }
        if warning_changed {
            self.notify_warning();
        }
    }

    /// Deferred expiry callback for the warning scheduled with `token`.
    ///
    /// A token superseded by a newer warning is ignored.
    pub fn fire_expiry(&mut self, token: ExpiryToken) -> bool {
        let cleared = self.warning.expire(token);
        if cleared {
            debug!(token = token.0, "warning expired");
            self.notify_warning();
        }
        cleared
    }

    /// Expire the warning if it is due at `now_ms`, for hosts that poll
    /// instead of scheduling callbacks.
    pub fn expire_due(&mut self, now_ms: i64) -> bool {
        let cleared = self.warning.expire_due(now_ms);
        if cleared {
            debug!(now_ms, "warning expired");
            self.notify_warning();
        }
        cleared
    }

    /// Full read-only history in ingestion order
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn stats(&self) -> ActivityStats {
        ActivityStats::from_counters(&self.counters, self.score)
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn warning(&self) -> &WarningState {
        &self.warning
    }

    /// Clicks retained by the window after the most recent click
    pub fn window_count(&self) -> usize {
        self.window.current_count()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Plain-text report of the full log
    pub fn export_report(&self) -> Result<String, MonitorError> {
        report::format_report(&self.log)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            stats: self.stats(),
            warning: self.warning.clone(),
            entries: self.log.clone(),
        }
    }

    /// End the logger's lifecycle and hand back the full log
    pub fn dispose(self) -> Vec<LogEntry> {
        info!(entries = self.log.len(), "Activity monitor disposed");
        self.log
    }

    fn clamp_timestamp(&mut self, timestamp_ms: i64) -> i64 {
        let clamped = match self.last_timestamp_ms {
            Some(last) if timestamp_ms < last => {
                warn!(
                    timestamp_ms,
                    last_timestamp_ms = last,
                    "timestamp regressed, clamping to last seen"
                );
                last
            }
            _ => timestamp_ms,
        };
        self.last_timestamp_ms = Some(clamped);
        clamped
    }

    fn notify_warning(&mut self) {
        for observer in self.observers.iter_mut() {
            observer.on_warning_changed(&self.warning);
        }
    }
}
