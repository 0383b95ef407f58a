//! Scoring engine: weighs a visitor's cumulative profile, session history,
//! and classified event counts into a lead score and quality tier.

use chrono::{DateTime, Duration, Utc};
use leadscope_core::config::{ScoringConfig, ScoringOverrides};
use leadscope_core::error::LeadScopeResult;
use leadscope_core::types::{Event, LeadStatus, Session, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::classifier::EventCounts;

/// Qualitative lead tier derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadQuality {
    Hot,
    Warm,
    Cold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub behavioral: f64,
    pub engagement: f64,
    pub total: f64,
}

/// Outcome of scoring one visitor. Always produced; a scoring fault yields
/// the zero result with `error` set instead of failing the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadScoreResult {
    /// Snapshot of the scored visitor. `None` only when the raw input could
    /// not be interpreted as a visitor at all.
    pub visitor: Option<Visitor>,
    pub lead_score: u64,
    pub lead_quality: LeadQuality,
    pub engagement_level: u64,
    pub total_duration_minutes: f64,
    pub event_counts: EventCounts,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub error: Option<String>,
}

impl LeadScoreResult {
    /// The defined zero-score fallback: score 0, `Cold`, all counts zero.
    pub fn degraded(visitor: Option<Visitor>, reason: String) -> Self {
        Self {
            visitor,
            lead_score: 0,
            lead_quality: LeadQuality::Cold,
            engagement_level: 0,
            total_duration_minutes: 0.0,
            event_counts: EventCounts::default(),
            score_breakdown: None,
            error: Some(reason),
        }
    }
}

/// Stateless scoring engine holding the default configuration. Safe to
/// share across tasks; every call reads its own inputs only.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    defaults: ScoringConfig,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(defaults: ScoringConfig) -> Self {
        Self { defaults }
    }

    /// Scores a visitor against their sessions and full event history.
    /// Never fails: internal faults degrade to the zero result.
    pub fn score(
        &self,
        visitor: &Visitor,
        sessions: &[Session],
        events: &[Event],
        overrides: Option<&ScoringOverrides>,
    ) -> LeadScoreResult {
        self.score_at(Utc::now(), visitor, sessions, events, overrides)
    }

    /// Same as [`score`](Self::score) with an explicit "now" for the
    /// recency buckets.
    pub fn score_at(
        &self,
        now: DateTime<Utc>,
        visitor: &Visitor,
        sessions: &[Session],
        events: &[Event],
        overrides: Option<&ScoringOverrides>,
    ) -> LeadScoreResult {
        match self.try_score(now, visitor, sessions, events, overrides) {
            Ok(result) => result,
            Err(e) => {
                warn!(visitor_id = %visitor.id, error = %e, "scoring degraded to zero result");
                LeadScoreResult::degraded(Some(visitor.clone()), e.to_string())
            }
        }
    }

    /// Scoring edge for raw JSON visitors from the fetch layer. A value
    /// that is not an object-like visitor degrades to the zero result with
    /// an invalid-input marker rather than aborting a batch.
    pub fn score_value(
        &self,
        visitor: &Value,
        sessions: &[Session],
        events: &[Event],
        overrides: Option<&ScoringOverrides>,
    ) -> LeadScoreResult {
        match Visitor::from_value(visitor) {
            Ok(visitor) => self.score(&visitor, sessions, events, overrides),
            Err(e) => {
                warn!(error = %e, "visitor payload rejected, emitting zero result");
                LeadScoreResult::degraded(None, e.to_string())
            }
        }
    }

    fn try_score(
        &self,
        now: DateTime<Utc>,
        visitor: &Visitor,
        sessions: &[Session],
        events: &[Event],
        overrides: Option<&ScoringOverrides>,
    ) -> LeadScopeResult<LeadScoreResult> {
        let config = match overrides {
            Some(o) => self.defaults.merge(o),
            None => self.defaults.clone(),
        };
        let counts = EventCounts::tally(events);

        // Sessions with no recorded duration contribute zero minutes.
        let total_minutes: f64 = sessions
            .iter()
            .map(|s| s.duration_secs.unwrap_or(0) as f64)
            .sum::<f64>()
            / 60.0;

        let b = &config.behavioral;
        let behavioral = visitor.page_views as f64 * b.page_view
            + visitor.total_sessions as f64 * b.session
            + total_minutes.min(b.minutes_cap) * b.minute_on_site
            + counts.clicks as f64 * b.click
            + counts.form_submits as f64 * b.form_submit
            + counts.scrolls as f64 * b.scroll
            + counts.downloads as f64 * b.download
            + counts.video_watches as f64 * b.video_watch;

        let engagement = self.engagement_bonus(&config, now, visitor);
        let total = behavioral + engagement;
        let lead_score = total.max(0.0).round() as u64;

        let t = &config.thresholds;
        let lead_quality = if lead_score as f64 >= t.hot {
            LeadQuality::Hot
        } else if lead_score as f64 >= t.warm {
            LeadQuality::Warm
        } else {
            LeadQuality::Cold
        };

        Ok(LeadScoreResult {
            visitor: Some(visitor.clone()),
            lead_score,
            lead_quality,
            engagement_level: counts.interactions(),
            total_duration_minutes: total_minutes,
            event_counts: counts,
            score_breakdown: Some(ScoreBreakdown {
                behavioral,
                engagement,
                total,
            }),
            error: None,
        })
    }

    fn engagement_bonus(&self, config: &ScoringConfig, now: DateTime<Utc>, visitor: &Visitor) -> f64 {
        let e = &config.engagement;

        let return_visitor = if visitor.total_sessions > 1 {
            (visitor.total_sessions - 1) as f64 * e.return_visitor_multiplier
        } else {
            0.0
        };

        // Both conditions required: a status change alone earns nothing.
        let has_name = visitor
            .lead_name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty());
        let identified = if visitor.lead_status != LeadStatus::Unknown && has_name {
            e.identified_lead_bonus
        } else {
            0.0
        };

        // First matching bucket wins; a visitor active today must not also
        // collect the this-week bonus.
        let age = now - visitor.last_seen;
        let recency = e
            .recency_tiers
            .iter()
            .find(|tier| age < Duration::hours(tier.max_age_hours))
            .map(|tier| tier.bonus)
            .unwrap_or(0.0);

        return_visitor + identified + recency
    }
}
