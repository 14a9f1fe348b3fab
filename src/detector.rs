//! Suspicious activity detection
//!
//! Two independent rules run on every ingestion, rapid clicking first and
//! high score second. The resulting signals feed a single-slot
//! [`WarningState`]; the last applied signal is the visible one, so a high
//! score warning supersedes a rapid click warning raised in the same pass.
//!
//! Auto-hide is a deferred expiry identified by an [`ExpiryToken`]. Raising a
//! new warning issues a new token, which invalidates any expiry scheduled for
//! an older one.

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::scoring;
use crate::types::{EventKind, InteractionEvent};
use crate::window::CLICK_WINDOW_MS;

/// Clicks inside the window that trigger a rapid clicking warning
pub const CLICK_THRESHOLD: usize = 25;

/// How long a raised warning stays active
pub const WARNING_TTL_MS: i64 = 6000;

/// Which rule produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    RapidClicking,
    HighScore,
}

/// A threshold breach reported by the detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSignal {
    pub kind: WarningKind,
    pub message: String,
}

/// Threshold rules for rapid clicking and high activity
#[derive(Debug, Clone)]
pub struct SuspicionDetector {
    click_threshold: usize,
    score_threshold: u32,
    window_ms: i64,
}

impl Default for SuspicionDetector {
    fn default() -> Self {
        Self {
            click_threshold: CLICK_THRESHOLD,
            score_threshold: scoring::ACTIVITY_SCORE_THRESHOLD,
            window_ms: CLICK_WINDOW_MS,
        }
    }
}

impl SuspicionDetector {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            click_threshold: config.click_threshold,
            score_threshold: config.score_threshold,
            window_ms: config.click_window_ms,
        }
    }

    /// Evaluate both rules for the latest event.
    ///
    /// Signals are returned in application order: rapid clicking, then high
    /// score.
    pub fn evaluate(
        &self,
        latest: &InteractionEvent,
        window_count: usize,
        score: u32,
    ) -> Vec<WarningSignal> {
        let mut signals = Vec::new();

        if latest.kind == EventKind::Click && window_count >= self.click_threshold {
            signals.push(WarningSignal {
                kind: WarningKind::RapidClicking,
                message: format!(
                    "Too many clicks ({}) in last {} seconds",
                    window_count,
                    format_seconds(self.window_ms)
                ),
            });
        }

        if scoring::is_elevated(score, self.score_threshold) {
            signals.push(WarningSignal {
                kind: WarningKind::HighScore,
                message: format!("High activity score ({})", score),
            });
        }

        signals
    }
}

/// Whole seconds print without a fraction, `2500` prints as `2.5`
fn format_seconds(ms: i64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        (ms as f64 / 1000.0).to_string()
    }
}

/// Identifies one scheduled warning expiry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpiryToken(pub u64);

/// The single visible warning slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningState {
    pub active: bool,
    pub message: String,
    pub kind: Option<WarningKind>,
    pub expires_at_ms: Option<i64>,
    /// Token of the currently scheduled expiry
    pub token: ExpiryToken,
    /// Not serialized; a deserialized state uses the default TTL
    #[serde(skip, default = "default_ttl_ms")]
    ttl_ms: i64,
}

fn default_ttl_ms() -> i64 {
    WARNING_TTL_MS
}

impl Default for WarningState {
    fn default() -> Self {
        Self::new(WARNING_TTL_MS)
    }
}

impl WarningState {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            active: false,
            message: String::new(),
            kind: None,
            expires_at_ms: None,
            token: ExpiryToken::default(),
            ttl_ms,
        }
    }

    /// Show `signal`, overwriting any active warning and restarting the
    /// expiry clock. Returns the token for the new expiry.
    pub fn raise(&mut self, signal: WarningSignal, now_ms: i64) -> ExpiryToken {
        self.token = ExpiryToken(self.token.0.wrapping_add(1));
        self.active = true;
        self.message = signal.message;
        self.kind = Some(signal.kind);
        self.expires_at_ms = Some(now_ms.saturating_add(self.ttl_ms));
        self.token
    }

    /// Deferred expiry callback. Only clears when `token` is still current.
    pub fn expire(&mut self, token: ExpiryToken) -> bool {
        if self.active && token == self.token {
            self.deactivate();
            true
        } else {
            false
        }
    }

    /// Clear the warning if its expiry time has been reached.
    pub fn expire_due(&mut self, now_ms: i64) -> bool {
        match self.expires_at_ms {
            Some(expires_at) if self.active && expires_at <= now_ms => {
                self.deactivate();
                true
            }
            _ => false,
        }
    }

    /// Hide without waiting for expiry. Returns whether anything changed.
    pub fn clear(&mut self) -> bool {
        let was_active = self.active;
        self.deactivate();
        was_active
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.message.clear();
        self.kind = None;
        self.expires_at_ms = None;
    }
}
