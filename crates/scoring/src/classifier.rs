//! Event classification: maps a raw event record onto a typed semantic
//! bucket with its payload fields extracted, plus a one-pass counter.

use leadscope_core::types::{Event, EventType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A classified event with the payload fields that matter for that type
/// pulled out of the free-form properties bag. Unrecognized types land in
/// `Other`; missing or malformed payload fields become `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventClass {
    PageView {
        url: Option<String>,
        title: Option<String>,
    },
    Click {
        element_id: Option<String>,
        element_class: Option<String>,
        element_text: Option<String>,
    },
    Scroll {
        depth_percent: Option<u8>,
    },
    FormSubmit {
        form_id: Option<String>,
        field_count: Option<u32>,
    },
    Download {
        file_url: Option<String>,
    },
    VideoWatch {
        video_url: Option<String>,
    },
    SystemInfo,
    Identify {
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    },
    Other {
        name: String,
    },
}

/// Classifies one event. Total and pure: never fails, never rejects.
pub fn classify(event: &Event) -> EventClass {
    match &event.event_type {
        EventType::PageView => EventClass::PageView {
            url: prop_str(event, "current_url"),
            title: prop_str(event, "page_title"),
        },
        EventType::Click => EventClass::Click {
            element_id: event.element_id.clone(),
            element_class: event.element_class.clone(),
            element_text: event.element_text.clone(),
        },
        EventType::Scroll => EventClass::Scroll {
            depth_percent: event
                .properties
                .get("depth_percent")
                .and_then(Value::as_u64)
                .map(|d| d.min(100) as u8),
        },
        EventType::FormSubmit => EventClass::FormSubmit {
            form_id: prop_str(event, "form_id").or_else(|| event.element_id.clone()),
            field_count: event
                .properties
                .get("field_count")
                .and_then(Value::as_u64)
                .map(|c| c as u32),
        },
        EventType::Download => EventClass::Download {
            file_url: prop_str(event, "file_url"),
        },
        EventType::VideoWatch => EventClass::VideoWatch {
            video_url: prop_str(event, "video_url"),
        },
        EventType::SystemInfo => EventClass::SystemInfo,
        EventType::Identify => EventClass::Identify {
            name: prop_str(event, "name"),
            email: prop_str(event, "email"),
            phone: prop_str(event, "phone"),
        },
        EventType::Custom(name) => EventClass::Other { name: name.clone() },
    }
}

fn prop_str(event: &Event, key: &str) -> Option<String> {
    event
        .properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Per-type event counts for a visitor or session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub page_views: u64,
    pub clicks: u64,
    pub scrolls: u64,
    pub form_submits: u64,
    pub downloads: u64,
    pub video_watches: u64,
    pub system_info: u64,
    pub identifies: u64,
    pub other: u64,
}

impl EventCounts {
    /// Tallies a slice of events in a single pass. Order-independent.
    pub fn tally(events: &[Event]) -> Self {
        let mut counts = EventCounts::default();
        for event in events {
            match &event.event_type {
                EventType::PageView => counts.page_views += 1,
                EventType::Click => counts.clicks += 1,
                EventType::Scroll => counts.scrolls += 1,
                EventType::FormSubmit => counts.form_submits += 1,
                EventType::Download => counts.downloads += 1,
                EventType::VideoWatch => counts.video_watches += 1,
                EventType::SystemInfo => counts.system_info += 1,
                EventType::Identify => counts.identifies += 1,
                EventType::Custom(_) => counts.other += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u64 {
        self.page_views
            + self.clicks
            + self.scrolls
            + self.form_submits
            + self.downloads
            + self.video_watches
            + self.system_info
            + self.identifies
            + self.other
    }

    /// Sum of interaction counts; page views are exposure, not interaction.
    pub fn interactions(&self) -> u64 {
        self.clicks + self.scrolls + self.form_submits + self.downloads + self.video_watches
    }
}
