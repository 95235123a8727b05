//! Tolerant accessors over loosely-typed records.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

pub const ELLIPSIS: &str = "...";

static NULL: JsonValue = JsonValue::Null;

/// Read-only view over one raw record (or a nested part of it). Missing keys
/// and wrong types read as empty values instead of failing.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    value: &'a JsonValue,
}

impl<'a> RecordView<'a> {
    pub fn new(value: &'a JsonValue) -> Self {
        Self { value }
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn get(&self, key: &str) -> Option<&'a JsonValue> {
        self.value.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn child(&self, key: &str) -> RecordView<'a> {
        RecordView::new(self.get(key).unwrap_or(&NULL))
    }

    pub fn str(&self, key: &str) -> &'a str {
        self.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn opt_str(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> &'a [JsonValue] {
        self.get(key)
            .and_then(|v| v.as_array())
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn text(&self, key: &str) -> String {
        value_text(self.get(key))
    }
}

/// Renders any JSON value as display text; strings are taken verbatim.
pub fn value_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Caps `text` at `max` characters, replacing the tail with an ellipsis
/// when anything was cut. The result never exceeds `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let marker = ELLIPSIS.chars().count();
    if max <= marker {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - marker).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").replace('\r', "")
}

/// Accepts RFC 3339 (any fraction length, including the 7-digit .NET form)
/// and zone-less ISO timestamps, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

pub fn epoch_seconds(value: &JsonValue) -> Option<DateTime<Utc>> {
    let secs = value.as_f64()?;
    if secs <= 0.0 || !secs.is_finite() {
        return None;
    }
    epoch_millis((secs * 1000.0).round() as i64)
}

/// Python-style title casing: upper-case after every non-letter.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn view_tolerates_missing_and_mistyped_fields() {
        let record = json!({"from": {"role": 1}, "text": 42, "channelData": null});
        let view = RecordView::new(&record);
        assert_eq!(view.str("text"), "");
        assert_eq!(view.text("text"), "42");
        assert_eq!(view.child("from").i64("role"), Some(1));
        assert!(view.child("channelData").array("items").is_empty());
        assert_eq!(view.child("missing").child("deeper").str("x"), "");

        let scalar = json!("not an object");
        let view = RecordView::new(&scalar);
        assert!(!view.is_object());
        assert_eq!(view.str("type"), "");
    }

    #[test]
    fn truncation_is_char_based_and_bounded() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghijkl", 10), "abcdefg...");
        assert_eq!(truncate_chars("ééééééééééééé", 5), "éé...");
        assert_eq!(truncate_chars("abcdef", 2), "ab");
    }

    #[test]
    fn parses_dotnet_and_zoneless_timestamps() {
        let ts = parse_timestamp("2024-05-01T10:00:00.1234567+00:00").unwrap();
        assert_eq!(ts.nanosecond() / 1_000_000, 123);
        let ts = parse_timestamp("2024-05-01T10:00:00.5Z").unwrap();
        assert_eq!(ts.nanosecond() / 1_000_000, 500);
        let ts = parse_timestamp("2024-05-01T10:00:01.250").unwrap();
        assert_eq!(ts.second(), 1);
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn title_case_matches_scope_labels() {
        assert_eq!(title_case("global"), "Global");
        assert_eq!(title_case("TOPIC"), "Topic");
        assert_eq!(title_case("conversation_scope"), "Conversation_Scope");
    }
}
