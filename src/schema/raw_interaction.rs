//! Raw interaction record
//!
//! One JSON object per platform event:
//!
//! ```json
//! {"type": "click", "timestamp_ms": 1705327509042,
//!  "target": {"tag": "BUTTON", "text": " Save "}, "path_length": 7}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::EventKind;

/// Element an interaction was dispatched to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTarget {
    /// Upper-case tag name, e.g. `BUTTON`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Text content, used to label buttons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A platform interaction as reported by the host, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInteraction {
    /// Optional identifier used in validation reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Platform event name: click, keydown, focus, blur or system
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,

    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp_ms: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EventTarget>,

    /// Length of the composed event path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_length: Option<u32>,

    /// Key value, e.g. `a` or `Enter`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Physical key code, e.g. `KeyA` or `Enter`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,

    /// Free text for system records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RawInteraction {
    pub fn new(event_type: &str, timestamp_ms: i64) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            timestamp_ms,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Resolve the platform event name to an [`EventKind`]
    pub fn kind(&self) -> Result<EventKind, ClassifyError> {
        let name = self
            .event_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ClassifyError::MissingType)?;

        match name.to_ascii_lowercase().as_str() {
            "click" => Ok(EventKind::Click),
            "keydown" | "key" => Ok(EventKind::Key),
            "focus" => Ok(EventKind::Focus),
            "blur" => Ok(EventKind::Blur),
            "system" => Ok(EventKind::System),
            _ => Err(ClassifyError::UnknownType(name.to_string())),
        }
    }

    /// Check that the record carries what its kind needs
    pub fn validate(&self) -> Result<(), ClassifyError> {
        match self.kind()? {
            EventKind::Key if self.key.is_none() && self.code.is_none() => {
                Err(ClassifyError::MissingKey)
            }
            _ => Ok(()),
        }
    }
}

/// Reasons a raw record cannot become an interaction event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("Missing event type")]
    MissingType,

    #[error("Unknown event type: {0}")]
    UnknownType(String),

    #[error("Key event without key or code")]
    MissingKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_click() {
        let json = r#"{"type": "click", "timestamp_ms": 42,
            "target": {"tag": "BUTTON", "text": "Save"}, "path_length": 7}"#;
        let raw: RawInteraction = serde_json::from_str(json).unwrap();

        assert_eq!(raw.kind().unwrap(), EventKind::Click);
        assert_eq!(raw.path_length, Some(7));
        assert_eq!(raw.target.unwrap().text.as_deref(), Some("Save"));
        assert!(!raw.ctrl_key);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RawInteraction::new("KEYDOWN", 0).kind().unwrap(), EventKind::Key);
        assert_eq!(RawInteraction::new(" blur ", 0).kind().unwrap(), EventKind::Blur);
        assert_eq!(RawInteraction::new("system", 0).kind().unwrap(), EventKind::System);
    }

    #[test]
    fn test_missing_and_unknown_type() {
        let raw: RawInteraction = serde_json::from_str(r#"{"timestamp_ms": 1}"#).unwrap();
        assert_eq!(raw.kind(), Err(ClassifyError::MissingType));

        let raw = RawInteraction::new("scroll", 1);
        assert_eq!(
            raw.validate(),
            Err(ClassifyError::UnknownType("scroll".to_string()))
        );
    }

    #[test]
    fn test_key_requires_key_or_code() {
        let mut raw = RawInteraction::new("keydown", 1);
        assert_eq!(raw.validate(), Err(ClassifyError::MissingKey));

        raw.code = Some("Enter".to_string());
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_missing_timestamp_is_parse_error() {
        let result = serde_json::from_str::<RawInteraction>(r#"{"type": "click"}"#);
        assert!(result.is_err());
    }
}
