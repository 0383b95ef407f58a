//! Timeline reconstruction for a single session.
//!
//! Raw events arrive loosely ordered; the reconstructor sorts them (stable,
//! so identical timestamps keep their input order), rebases every timestamp
//! onto the session start, derives per-page dwell times from consecutive
//! page views, and summarizes engagement.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use leadscope_core::error::{LeadScopeError, LeadScopeResult};
use leadscope_core::types::{Event, EventType, Session, Visitor};
use leadscope_scoring::{LeadScoreResult, ScoringEngine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Event types that count as conversions within a session.
const CONVERSION_TYPES: [&str; 3] = ["form_submit", "signup", "purchase"];

/// One event rebased onto the session clock. `offset_ms` may be negative
/// when the event's clock disagrees with the session start; that skew is
/// preserved for downstream detection, never clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub offset_ms: i64,
    pub event_type: EventType,
    pub name: Option<String>,
    pub element_id: Option<String>,
    pub element_class: Option<String>,
    pub properties: HashMap<String, Value>,
    pub page: Option<String>,
}

/// One page segment of the session journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageJourneyEntry {
    pub page: String,
    pub entered_at_offset_ms: i64,
    pub duration_ms: i64,
    /// Events of any type whose timestamp falls inside this page's window.
    pub events_during: u64,
}

/// Session-level engagement aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionEngagement {
    pub clicks: u64,
    pub scrolls: u64,
    pub form_submits: u64,
    pub page_view_count: u64,
    pub unique_page_views: u64,
    /// Exactly one page-view event in the session (bounce).
    pub single_page_session: bool,
    /// Conversion-type events in first-seen order; repeats preserved.
    pub conversion_events: Vec<EventType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReplay {
    pub session_id: Uuid,
    pub timeline: Vec<TimelineEvent>,
    pub page_journey: Vec<PageJourneyEntry>,
    pub engagement: SessionEngagement,
    /// Read-only enrichment for display; absent when no visitor was given.
    pub lead_score: Option<LeadScoreResult>,
}

/// Rebuilds session replays. Holds a scoring engine only for the optional
/// lead-score annotation.
#[derive(Debug, Clone, Default)]
pub struct SessionReconstructor {
    engine: ScoringEngine,
}

impl SessionReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    /// Reconstructs one session from its raw events. The session start is
    /// the time anchor and is required.
    pub fn reconstruct(
        &self,
        session: &Session,
        events: &[Event],
    ) -> LeadScopeResult<SessionReplay> {
        let started_at = session
            .started_at
            .ok_or(LeadScopeError::MissingTemporalAnchor(session.id))?;

        let mut sorted: Vec<&Event> = events.iter().collect();
        // Stable sort: ties keep original array position.
        sorted.sort_by_key(|e| e.event_timestamp);

        let timeline = build_timeline(session, started_at, &sorted);
        let page_journey = build_page_journey(session, started_at, &sorted);
        let engagement = build_engagement(session, &sorted);

        Ok(SessionReplay {
            session_id: session.id,
            timeline,
            page_journey,
            engagement,
            lead_score: None,
        })
    }

    /// [`reconstruct`](Self::reconstruct) plus a lead-score annotation for
    /// the session's owning visitor, scored over this session only.
    pub fn reconstruct_with_visitor(
        &self,
        session: &Session,
        events: &[Event],
        visitor: &Visitor,
    ) -> LeadScopeResult<SessionReplay> {
        let mut replay = self.reconstruct(session, events)?;
        replay.lead_score = Some(
            self.engine
                .score(visitor, std::slice::from_ref(session), events, None),
        );
        Ok(replay)
    }
}

fn event_page(session: &Session, event: &Event) -> Option<String> {
    event
        .page_url()
        .map(str::to_string)
        .or_else(|| session.landing_page.clone())
}

fn build_timeline(
    session: &Session,
    started_at: DateTime<Utc>,
    sorted: &[&Event],
) -> Vec<TimelineEvent> {
    sorted
        .iter()
        .map(|event| TimelineEvent {
            offset_ms: (event.event_timestamp - started_at).num_milliseconds(),
            event_type: event.event_type.clone(),
            name: event.name.clone(),
            element_id: event.element_id.clone(),
            element_class: event.element_class.clone(),
            properties: event.properties.clone(),
            page: event_page(session, event),
        })
        .collect()
}

fn build_page_journey(
    session: &Session,
    started_at: DateTime<Utc>,
    sorted: &[&Event],
) -> Vec<PageJourneyEntry> {
    let page_views: Vec<&&Event> = sorted
        .iter()
        .filter(|e| e.event_type == EventType::PageView)
        .collect();

    let session_end = session
        .duration_secs
        .map(|d| started_at + Duration::seconds(d));

    let mut journey = Vec::with_capacity(page_views.len());
    for (i, pv) in page_views.iter().enumerate() {
        let entered_at_offset_ms = (pv.event_timestamp - started_at).num_milliseconds();
        let next_ts = page_views.get(i + 1).map(|n| n.event_timestamp);

        let duration_ms = match next_ts {
            Some(next) => (next - pv.event_timestamp).num_milliseconds(),
            // Last page: closes at the recorded session duration, or 0
            // when the session never got one.
            None => match session.duration_secs {
                Some(d) => d * 1000 - entered_at_offset_ms,
                None => 0,
            },
        };

        // Window is [this page view, next page view); the last window runs
        // to the session end, or to the end of the event list without one.
        let upper = next_ts.or(session_end);
        let events_during = sorted
            .iter()
            .filter(|e| {
                e.event_timestamp >= pv.event_timestamp
                    && upper.map_or(true, |u| e.event_timestamp < u)
            })
            .count() as u64;

        journey.push(PageJourneyEntry {
            page: event_page(session, pv).unwrap_or_else(|| "(unknown)".to_string()),
            entered_at_offset_ms,
            duration_ms,
            events_during,
        });
    }
    journey
}

fn build_engagement(session: &Session, sorted: &[&Event]) -> SessionEngagement {
    let mut engagement = SessionEngagement::default();
    let mut pages_seen: HashSet<String> = HashSet::new();

    for event in sorted {
        match &event.event_type {
            EventType::Click => engagement.clicks += 1,
            EventType::Scroll => engagement.scrolls += 1,
            EventType::FormSubmit => engagement.form_submits += 1,
            EventType::PageView => {
                engagement.page_view_count += 1;
                if let Some(page) = event_page(session, event) {
                    pages_seen.insert(page);
                }
            }
            _ => {}
        }
        if CONVERSION_TYPES.contains(&event.event_type.as_str()) {
            engagement.conversion_events.push(event.event_type.clone());
        }
    }

    engagement.unique_page_views = pages_seen.len() as u64;
    engagement.single_page_session = engagement.page_view_count == 1;
    engagement
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_start() -> DateTime<Utc> {
        "2026-03-10T09:00:00Z".parse().unwrap()
    }

    fn make_session(duration_secs: Option<i64>) -> Session {
        Session {
            id: Uuid::new_v4(),
            visitor_id: Uuid::new_v4(),
            site_id: "site-1".into(),
            started_at: Some(session_start()),
            ended_at: None,
            duration_secs,
            browser: Some("Firefox".into()),
            os: Some("Linux".into()),
            device: Some("desktop".into()),
            landing_page: Some("https://example.com/".into()),
        }
    }

    fn make_event(session: &Session, event_type: EventType, offset_ms: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            session_id: session.id,
            visitor_id: session.visitor_id,
            event_type,
            name: None,
            element_id: None,
            element_class: None,
            element_text: None,
            properties: HashMap::new(),
            event_timestamp: session_start() + Duration::milliseconds(offset_ms),
        }
    }

    fn page_view(session: &Session, url: &str, offset_ms: i64) -> Event {
        let mut event = make_event(session, EventType::PageView, offset_ms);
        event.properties.insert("current_url".into(), json!(url));
        event
    }

    #[test]
    fn test_missing_start_is_reported() {
        let mut session = make_session(Some(20));
        session.started_at = None;
        let err = SessionReconstructor::new()
            .reconstruct(&session, &[])
            .unwrap_err();
        assert!(matches!(err, LeadScopeError::MissingTemporalAnchor(id) if id == session.id));
    }

    #[test]
    fn test_page_journey_durations() {
        let session = make_session(Some(20));
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            page_view(&session, "https://example.com/pricing", 5_000),
            page_view(&session, "https://example.com/signup", 12_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();

        let durations: Vec<i64> = replay.page_journey.iter().map(|p| p.duration_ms).collect();
        assert_eq!(durations, vec![5_000, 7_000, 8_000]);
        let offsets: Vec<i64> = replay
            .page_journey
            .iter()
            .map(|p| p.entered_at_offset_ms)
            .collect();
        assert_eq!(offsets, vec![0, 5_000, 12_000]);
    }

    #[test]
    fn test_last_page_duration_falls_back_to_zero() {
        let session = make_session(None);
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            page_view(&session, "https://example.com/docs", 4_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(replay.page_journey[0].duration_ms, 4_000);
        assert_eq!(replay.page_journey[1].duration_ms, 0);
    }

    #[test]
    fn test_events_during_uses_half_open_windows() {
        let session = make_session(Some(20));
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            make_event(&session, EventType::Click, 1_000),
            make_event(&session, EventType::Scroll, 4_999),
            // Lands exactly on the second page view: belongs to segment 2.
            make_event(&session, EventType::Click, 5_000),
            page_view(&session, "https://example.com/pricing", 5_000),
            make_event(&session, EventType::Click, 9_000),
            // Past the 20s session end: outside every window.
            make_event(&session, EventType::Click, 25_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();

        // Segment 1: its own page view + click + scroll.
        assert_eq!(replay.page_journey[0].events_during, 3);
        // Segment 2: boundary click, its page view, and the 9s click.
        assert_eq!(replay.page_journey[1].events_during, 3);
    }

    #[test]
    fn test_single_page_session_is_bounce() {
        let session = make_session(Some(30));
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            make_event(&session, EventType::Scroll, 2_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert!(replay.engagement.single_page_session);
        assert_eq!(replay.engagement.page_view_count, 1);

        let events = vec![
            page_view(&session, "https://example.com/", 0),
            page_view(&session, "https://example.com/a", 1_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert!(!replay.engagement.single_page_session);
    }

    #[test]
    fn test_negative_offsets_are_preserved() {
        let session = make_session(Some(20));
        let events = vec![
            make_event(&session, EventType::SystemInfo, -1_500),
            page_view(&session, "https://example.com/", 0),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(replay.timeline[0].offset_ms, -1_500);
    }

    #[test]
    fn test_identical_timestamps_keep_input_order() {
        let session = make_session(Some(20));
        let mut first = make_event(&session, EventType::Click, 1_000);
        first.element_id = Some("a".into());
        let mut second = make_event(&session, EventType::Click, 1_000);
        second.element_id = Some("b".into());

        let replay = SessionReconstructor::new()
            .reconstruct(&session, &[first, second])
            .unwrap();
        assert_eq!(replay.timeline[0].element_id.as_deref(), Some("a"));
        assert_eq!(replay.timeline[1].element_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_page_defaults_to_landing_page() {
        let session = make_session(Some(20));
        let events = vec![make_event(&session, EventType::Click, 500)];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(
            replay.timeline[0].page.as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_conversion_events_preserve_repeats_in_order() {
        let session = make_session(Some(60));
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            make_event(&session, EventType::FormSubmit, 3_000),
            make_event(&session, EventType::from_name("purchase"), 8_000),
            make_event(&session, EventType::FormSubmit, 10_000),
            make_event(&session, EventType::from_name("newsletter_open"), 12_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(
            replay.engagement.conversion_events,
            vec![
                EventType::FormSubmit,
                EventType::from_name("purchase"),
                EventType::FormSubmit,
            ]
        );
    }

    #[test]
    fn test_unique_page_views_counts_distinct_pages() {
        let session = make_session(Some(60));
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            page_view(&session, "https://example.com/pricing", 2_000),
            page_view(&session, "https://example.com/", 4_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(replay.engagement.page_view_count, 3);
        assert_eq!(replay.engagement.unique_page_views, 2);
    }

    #[test]
    fn test_visitor_enrichment_attaches_lead_score() {
        let session = make_session(Some(600));
        let visitor = Visitor {
            id: session.visitor_id,
            first_seen: session_start() - Duration::days(10),
            last_seen: session_start(),
            page_views: 12,
            total_sessions: 3,
            region: None,
            country: Some("IS".into()),
            lead_status: leadscope_core::types::LeadStatus::Identified,
            lead_name: Some("Freyja".into()),
            lead_email: None,
            lead_phone: None,
        };
        let events = vec![
            page_view(&session, "https://example.com/", 0),
            make_event(&session, EventType::FormSubmit, 5_000),
        ];
        let replay = SessionReconstructor::new()
            .reconstruct_with_visitor(&session, &events, &visitor)
            .unwrap();

        let score = replay.lead_score.expect("annotation present");
        assert!(score.error.is_none());
        assert!(score.lead_score > 0);
        // Enrichment must not change the reconstruction itself.
        let plain = SessionReconstructor::new()
            .reconstruct(&session, &events)
            .unwrap();
        assert_eq!(plain.page_journey, replay.page_journey);
        assert_eq!(plain.engagement, replay.engagement);
    }
}
