//! Shared data model: visitors, sessions, and raw behavioral events as they
//! arrive from the collection layer.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{LeadScopeError, LeadScopeResult};

/// Lead qualification state of a visitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    Unknown,
    Identified,
    Lead,
    Captured,
}

/// A tracked visitor and their cumulative activity profile.
///
/// Invariant: `last_seen >= first_seen`. Created on first observed activity,
/// bumped on every subsequent one; deletion is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
    pub id: Uuid,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default, deserialize_with = "de_count")]
    pub page_views: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub total_sessions: u64,
    pub region: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub lead_status: LeadStatus,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
}

impl Visitor {
    /// Builds a visitor from raw JSON as it comes off the wire. Count fields
    /// go through [`coerce_count_or_zero`]; anything that is not an object
    /// at all is rejected as invalid input.
    pub fn from_value(value: &Value) -> LeadScopeResult<Self> {
        if !value.is_object() {
            return Err(LeadScopeError::InvalidInput(
                "visitor must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| LeadScopeError::InvalidInput(format!("malformed visitor: {e}")))
    }
}

/// A single browsing session owned by one visitor.
///
/// `duration_secs` is the authoritative session length for all derived
/// figures; `ended_at` is carried for reporting but never used to compute
/// durations (upstream does not keep the two consistent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub site_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub landing_page: Option<String>,
}

/// A raw behavioral event. Immutable once recorded; ordering between events
/// with identical timestamps is undefined input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub session_id: Uuid,
    pub visitor_id: Uuid,
    pub event_type: EventType,
    pub name: Option<String>,
    pub element_id: Option<String>,
    pub element_class: Option<String>,
    pub element_text: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    pub event_timestamp: DateTime<Utc>,
}

impl Event {
    /// URL the event occurred on, when the capture layer recorded one.
    pub fn page_url(&self) -> Option<&str> {
        self.properties.get("current_url").and_then(Value::as_str)
    }
}

/// Semantic type of a behavioral event. Wire values the collector does not
/// recognize round-trip through `Custom` rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    PageView,
    Click,
    Scroll,
    FormSubmit,
    Download,
    VideoWatch,
    SystemInfo,
    Identify,
    Custom(String),
}

impl EventType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "page_view" => EventType::PageView,
            "click" => EventType::Click,
            "scroll" => EventType::Scroll,
            "form_submit" => EventType::FormSubmit,
            "download" => EventType::Download,
            "video_watch" => EventType::VideoWatch,
            "system_info" => EventType::SystemInfo,
            "identify" => EventType::Identify,
            other => EventType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::PageView => "page_view",
            EventType::Click => "click",
            EventType::Scroll => "scroll",
            EventType::FormSubmit => "form_submit",
            EventType::Download => "download",
            EventType::VideoWatch => "video_watch",
            EventType::SystemInfo => "system_info",
            EventType::Identify => "identify",
            EventType::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EventType::from_name(&name))
    }
}

/// Leniency policy for count fields arriving from partially malformed
/// upstream data: integers pass through, floats truncate, numeric strings
/// parse, everything else (and anything negative) becomes 0.
pub fn coerce_count_or_zero(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(i) = n.as_i64() {
                i.max(0) as u64
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => f as u64,
            _ => {
                debug!(raw = %s, "count field failed numeric coercion, defaulting to 0");
                0
            }
        },
        Value::Null => 0,
        other => {
            debug!(kind = ?other, "non-numeric count field, defaulting to 0");
            0
        }
    }
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count_or_zero(&value))
}
