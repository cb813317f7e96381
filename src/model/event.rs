//! Raw transcript events.
//!
//! Each transcript line is one JSON object with a `type` discriminant.
//! Fields are pulled out leniently: a well-formed object whose fields have
//! unexpected shapes still produces an event, it just carries less data.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Closed set of record kinds the parser reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Human input or tool results.
    User,
    /// Model responses.
    Assistant,
    /// System notices.
    System,
    /// Context compaction summaries.
    Summary,
    /// File state snapshots used for undo.
    FileHistorySnapshot,
    /// Session rename marker.
    CustomTitle,
    /// Anything else, keyed by its discriminant.
    Other(String),
}

impl EventKind {
    /// Map a `type` discriminant to a kind.
    #[must_use]
    pub fn from_discriminant(value: &str) -> Self {
        match value {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "summary" => Self::Summary,
            "file-history-snapshot" => Self::FileHistorySnapshot,
            "custom-title" => Self::CustomTitle,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
            Self::Summary => write!(f, "summary"),
            Self::FileHistorySnapshot => write!(f, "file-history-snapshot"),
            Self::CustomTitle => write!(f, "custom-title"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// One decoded transcript line.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Type discriminant.
    pub kind: EventKind,
    /// `message.role`, if present.
    pub role: Option<String>,
    /// Content payload (`message.content`, or top-level `content`).
    pub content: Option<Value>,
    /// Event timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Event identity.
    pub uuid: Option<String>,
    /// Parent event identity.
    pub parent_uuid: Option<String>,
    /// Session identifier.
    pub session_id: Option<String>,
    /// Working directory at the time of the event.
    pub cwd: Option<String>,
    /// Git branch at the time of the event.
    pub git_branch: Option<String>,
    /// Model identifier for assistant events.
    pub model: Option<String>,
    /// Summary text for `summary` records.
    pub summary: Option<String>,
    /// New title for `custom-title` records.
    pub custom_title: Option<String>,
    /// Whether this user message is a compaction summary.
    pub is_compact_summary: bool,
    /// The full original object.
    pub raw: Value,
}

impl RawEvent {
    /// Build an event from a decoded JSON value.
    ///
    /// Returns `None` when the value is not an object.
    #[must_use]
    pub fn from_value(raw: Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let message = obj.get("message").and_then(Value::as_object);

        let kind = EventKind::from_discriminant(str_field(obj, "type").unwrap_or("untyped"));
        let content = message
            .and_then(|m| m.get("content"))
            .or_else(|| obj.get("content"))
            .cloned();

        Some(Self {
            kind,
            role: message.and_then(|m| str_field(m, "role")).map(String::from),
            content,
            timestamp: str_field(obj, "timestamp").and_then(parse_timestamp),
            uuid: string_field(obj, "uuid"),
            parent_uuid: string_field(obj, "parentUuid"),
            session_id: string_field(obj, "sessionId"),
            cwd: string_field(obj, "cwd"),
            git_branch: string_field(obj, "gitBranch"),
            model: message.and_then(|m| str_field(m, "model")).map(String::from),
            summary: string_field(obj, "summary"),
            custom_title: string_field(obj, "customTitle"),
            is_compact_summary: obj
                .get("isCompactSummary")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            raw,
        })
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(obj, key).filter(|s| !s.is_empty()).map(String::from)
}

/// Parse an RFC 3339 timestamp into UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
