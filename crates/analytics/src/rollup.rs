//! Daily rollups and cross-sectional stats over already-fetched session and
//! event collections.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use leadscope_core::types::{Event, EventType, Session, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Totals for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    /// Distinct visitor ids among sessions started that day.
    pub visitors: u64,
    pub sessions: u64,
    pub page_views: u64,
}

/// Rolls up the last `days_back` days including today, walking backward
/// from a capture-time anchor.
pub fn daily_rollup<'a>(
    sessions: &'a [Session],
    page_view_events: &'a [Event],
    days_back: u32,
) -> DailyRollup<'a> {
    daily_rollup_from(Utc::now().date_naive(), sessions, page_view_events, days_back)
}

/// As [`daily_rollup`] with an explicit anchor day.
pub fn daily_rollup_from<'a>(
    anchor: NaiveDate,
    sessions: &'a [Session],
    page_view_events: &'a [Event],
    days_back: u32,
) -> DailyRollup<'a> {
    DailyRollup {
        sessions,
        events: page_view_events,
        anchor,
        days_back,
        emitted: 0,
    }
}

/// Lazy iterator over daily buckets, oldest to newest, exactly `days_back`
/// entries. `Clone` restarts the walk from the same anchor.
#[derive(Debug, Clone)]
pub struct DailyRollup<'a> {
    sessions: &'a [Session],
    events: &'a [Event],
    anchor: NaiveDate,
    days_back: u32,
    emitted: u32,
}

impl Iterator for DailyRollup<'_> {
    type Item = DailyBucket;

    fn next(&mut self) -> Option<DailyBucket> {
        if self.emitted >= self.days_back {
            return None;
        }
        let back = i64::from(self.days_back - 1 - self.emitted);
        let date = self.anchor - Duration::days(back);
        self.emitted += 1;

        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let in_window = |ts: DateTime<Utc>| ts >= start && ts < end;

        let mut visitor_ids: HashSet<Uuid> = HashSet::new();
        let mut session_count = 0u64;
        for session in self.sessions {
            if session.started_at.is_some_and(in_window) {
                visitor_ids.insert(session.visitor_id);
                session_count += 1;
            }
        }
        let page_views = self
            .events
            .iter()
            .filter(|e| e.event_type == EventType::PageView && in_window(e.event_timestamp))
            .count() as u64;

        Some(DailyBucket {
            date,
            visitors: visitor_ids.len() as u64,
            sessions: session_count,
            page_views,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.days_back - self.emitted) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailyRollup<'_> {}

/// Cross-sectional totals for a site's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_visitors: u64,
    /// Distinct visitor ids across the session collection.
    pub unique_visitors: u64,
    pub total_sessions: u64,
    pub total_events: u64,
    pub total_leads: u64,
    /// Distinct visitors with a session in the last day.
    pub daily_active: u64,
    /// Distinct visitors with a session in the last 30 days.
    pub monthly_active: u64,
    pub generated_at: DateTime<Utc>,
}

pub fn stats(
    sessions: &[Session],
    events: &[Event],
    visitors: &[Visitor],
    leads: &[Visitor],
) -> StatsSummary {
    stats_at(Utc::now(), sessions, events, visitors, leads)
}

/// As [`stats`] with an explicit "now" anchoring the active-user windows.
pub fn stats_at(
    now: DateTime<Utc>,
    sessions: &[Session],
    events: &[Event],
    visitors: &[Visitor],
    leads: &[Visitor],
) -> StatsSummary {
    let day_cutoff = now - Duration::days(1);
    let month_cutoff = now - Duration::days(30);

    let mut unique: HashSet<Uuid> = HashSet::new();
    let mut daily: HashSet<Uuid> = HashSet::new();
    let mut monthly: HashSet<Uuid> = HashSet::new();
    for session in sessions {
        unique.insert(session.visitor_id);
        if let Some(started_at) = session.started_at {
            if started_at >= day_cutoff && started_at <= now {
                daily.insert(session.visitor_id);
            }
            if started_at >= month_cutoff && started_at <= now {
                monthly.insert(session.visitor_id);
            }
        }
    }

    StatsSummary {
        total_visitors: visitors.len() as u64,
        unique_visitors: unique.len() as u64,
        total_sessions: sessions.len() as u64,
        total_events: events.len() as u64,
        total_leads: leads.len() as u64,
        daily_active: daily.len() as u64,
        monthly_active: monthly.len() as u64,
        generated_at: now,
    }
}
