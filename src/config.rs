//! Monitor configuration
//!
//! Thresholds and timing for detection and display. The score weights are
//! fixed and not part of the configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::detector::{CLICK_THRESHOLD, WARNING_TTL_MS};
use crate::error::MonitorError;
use crate::scoring::{ACTIVITY_SCORE_THRESHOLD, MAX_SCORE};
use crate::view::DISPLAY_LIMIT;
use crate::window::CLICK_WINDOW_MS;

const MAX_OFFSET_MINUTES: u32 = 24 * 60;

/// Tunable settings for an [`ActivityLogger`](crate::logger::ActivityLogger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Clicks inside the window that count as rapid clicking
    pub click_threshold: usize,
    /// Length of the rapid-click window
    pub click_window_ms: i64,
    /// Scores strictly above this raise a warning
    pub score_threshold: u32,
    /// How long a warning stays visible
    pub warning_ttl_ms: i64,
    /// Entries kept by a [`LogView`](crate::view::LogView)
    pub display_limit: usize,
    /// Offset used to format entry times
    pub utc_offset_minutes: i32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            click_threshold: CLICK_THRESHOLD,
            click_window_ms: CLICK_WINDOW_MS,
            score_threshold: ACTIVITY_SCORE_THRESHOLD,
            warning_ttl_ms: WARNING_TTL_MS,
            display_limit: DISPLAY_LIMIT,
            utc_offset_minutes: 0,
        }
    }
}

impl MonitorConfig {
    /// Load and validate configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, MonitorError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MonitorError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.click_threshold == 0 {
            return Err(MonitorError::ConfigError(
                "click_threshold must be at least 1".to_string(),
            ));
        }
        if self.click_window_ms <= 0 {
            return Err(MonitorError::ConfigError(
                "click_window_ms must be positive".to_string(),
            ));
        }
        if self.warning_ttl_ms <= 0 {
            return Err(MonitorError::ConfigError(
                "warning_ttl_ms must be positive".to_string(),
            ));
        }
        if self.score_threshold > MAX_SCORE {
            return Err(MonitorError::ConfigError(format!(
                "score_threshold must not exceed {}",
                MAX_SCORE
            )));
        }
        if self.utc_offset_minutes.unsigned_abs() >= MAX_OFFSET_MINUTES {
            return Err(MonitorError::ConfigError(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Offset for time formatting; an invalid value falls back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_constants() {
        let config = MonitorConfig::default();
        assert_eq!(config.click_threshold, 25);
        assert_eq!(config.click_window_ms, 5000);
        assert_eq!(config.score_threshold, 80);
        assert_eq!(config.warning_ttl_ms, 6000);
        assert_eq!(config.display_limit, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json(r#"{"click_threshold": 10, "utc_offset_minutes": 120}"#)
            .unwrap();
        assert_eq!(
            config,
            MonitorConfig {
                click_threshold: 10,
                utc_offset_minutes: 120,
                ..MonitorConfig::default()
            }
        );
        assert_eq!(config.utc_offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(MonitorConfig::from_json(r#"{"click_window_ms": 0}"#).is_err());
        assert!(MonitorConfig::from_json(r#"{"warning_ttl_ms": -5}"#).is_err());
        assert!(MonitorConfig::from_json(r#"{"score_threshold": 101}"#).is_err());
        assert!(MonitorConfig::from_json(r#"{"utc_offset_minutes": 1440}"#).is_err());
        assert!(MonitorConfig::from_json(r#"{"click_threshold": 0}"#).is_err());
        assert!(MonitorConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        for minutes in [i32::MAX, i32::MIN, 1440] {
            let config = MonitorConfig {
                utc_offset_minutes: minutes,
                ..MonitorConfig::default()
            };
            assert_eq!(config.utc_offset().local_minus_utc(), 0);
            assert!(config.validate().is_err());
        }

        let config = MonitorConfig {
            utc_offset_minutes: -330,
            ..MonitorConfig::default()
        };
        assert_eq!(config.utc_offset().local_minus_utc(), -330 * 60);
    }
}
