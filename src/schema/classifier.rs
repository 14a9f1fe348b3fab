//! Classifier from raw interaction records to interaction events

use crate::error::MonitorError;
use crate::schema::raw_interaction::*;
use crate::types::{EventKind, InteractionEvent};

/// Turns [`RawInteraction`]s into [`InteractionEvent`]s
pub struct InteractionClassifier;

impl InteractionClassifier {
    /// Parse a JSON array of raw interactions
    pub fn parse_array(json: &str) -> Result<Vec<RawInteraction>, MonitorError> {
        let records: Vec<RawInteraction> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one raw interaction per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawInteraction>, MonitorError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record = Self::parse_line(trimmed).map_err(|e| {
                MonitorError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Parse a single JSON object
    pub fn parse_line(line: &str) -> Result<RawInteraction, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Classify one record, building the descriptive detail for its kind
    pub fn classify(raw: &RawInteraction) -> Result<InteractionEvent, ClassifyError> {
        raw.validate()?;
        let kind = raw.kind()?;

        let detail = match kind {
            EventKind::Click => click_detail(raw),
            EventKind::Key => key_detail(raw),
            EventKind::Focus | EventKind::Blur => focus_detail(raw),
            EventKind::System => raw.message.clone().unwrap_or_default(),
        };

        Ok(InteractionEvent::new(kind, raw.timestamp_ms, detail))
    }

    /// Classify a batch, failing on the first malformed record
    pub fn classify_all(records: &[RawInteraction]) -> Result<Vec<InteractionEvent>, MonitorError> {
        records
            .iter()
            .map(|r| Self::classify(r).map_err(MonitorError::from))
            .collect()
    }

    /// Report every record that would be rejected
    pub fn validate_records(records: &[RawInteraction]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    event_id: record.event_id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A rejected record in a batch
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub event_id: Option<String>,
    pub error: ClassifyError,
}

/// `element: {label}  path-length: {n}`; buttons are labelled by their text
fn click_detail(raw: &RawInteraction) -> String {
    let target = raw.target.as_ref();
    let tag = target.and_then(|t| t.tag.as_deref());

    let label = match tag {
        Some(tag) if tag.eq_ignore_ascii_case("BUTTON") => target
            .and_then(|t| t.text.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        Some(tag) => tag.to_string(),
        None => "UNKNOWN".to_string(),
    };

    format!(
        "element: {}  path-length: {}",
        label,
        raw.path_length.unwrap_or(0)
    )
}

/// Printable keys by value, others by code, then held modifiers.
///
/// A key value is printable when it is a single UTF-16 code unit, the way
/// browsers report `key.length`; astral characters fall back to the code.
fn key_detail(raw: &RawInteraction) -> String {
    let key = match (raw.key.as_deref(), raw.code.as_deref()) {
        (Some(key), _) if key.encode_utf16().count() == 1 => key,
        (_, Some(code)) => code,
        (Some(key), None) => key,
        (None, None) => "",
    };

    let mut detail = key.to_string();
    if raw.ctrl_key {
        detail.push_str(" + Ctrl");
    }
    if raw.shift_key {
        detail.push_str(" + Shift");
    }
    if raw.alt_key {
        detail.push_str(" + Alt");
    }
    detail
}

/// `element: {id | tag | window}`
fn focus_detail(raw: &RawInteraction) -> String {
    let target = raw.target.as_ref();
    let name = target
        .and_then(|t| t.id.as_deref())
        .filter(|id| !id.is_empty())
        .or_else(|| {
            target
                .and_then(|t| t.tag.as_deref())
                .filter(|tag| !tag.is_empty())
        })
        .unwrap_or("window");

    format!("element: {}", name)
}
