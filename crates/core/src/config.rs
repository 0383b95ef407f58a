//! Scoring configuration. A `ScoringConfig` carries the full weight table
//! with defaults filled in; callers override any subset per call through
//! [`ScoringOverrides`], which merges field-by-field onto the defaults and
//! never mutates them.

use serde::{Deserialize, Serialize};

/// Weights applied to raw behavioral counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralWeights {
    #[serde(default = "default_page_view_weight")]
    pub page_view: f64,
    #[serde(default = "default_session_weight")]
    pub session: f64,
    #[serde(default = "default_minute_weight")]
    pub minute_on_site: f64,
    /// Cap on the number of minutes that earn time credit.
    #[serde(default = "default_minutes_cap")]
    pub minutes_cap: f64,
    #[serde(default = "default_click_weight")]
    pub click: f64,
    #[serde(default = "default_form_submit_weight")]
    pub form_submit: f64,
    #[serde(default = "default_scroll_weight")]
    pub scroll: f64,
    #[serde(default = "default_download_weight")]
    pub download: f64,
    #[serde(default = "default_video_watch_weight")]
    pub video_watch: f64,
}

/// One recency bucket: applies when the visitor was last seen no more than
/// `max_age_hours` ago. Buckets are evaluated in order, first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyTier {
    pub max_age_hours: i64,
    pub bonus: f64,
}

/// Bonuses layered on top of the behavioral subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementBonuses {
    #[serde(default = "default_return_visitor_multiplier")]
    pub return_visitor_multiplier: f64,
    #[serde(default = "default_identified_lead_bonus")]
    pub identified_lead_bonus: f64,
    #[serde(default = "default_recency_tiers")]
    pub recency_tiers: Vec<RecencyTier>,
}

/// Score cutoffs for lead quality tiers; inclusive lower bounds, compared
/// hot-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_hot_threshold")]
    pub hot: f64,
    #[serde(default = "default_warm_threshold")]
    pub warm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub behavioral: BehavioralWeights,
    #[serde(default)]
    pub engagement: EngagementBonuses,
    #[serde(default)]
    pub thresholds: TierThresholds,
}

impl Default for BehavioralWeights {
    fn default() -> Self {
        Self {
            page_view: default_page_view_weight(),
            session: default_session_weight(),
            minute_on_site: default_minute_weight(),
            minutes_cap: default_minutes_cap(),
            click: default_click_weight(),
            form_submit: default_form_submit_weight(),
            scroll: default_scroll_weight(),
            download: default_download_weight(),
            video_watch: default_video_watch_weight(),
        }
    }
}

impl Default for EngagementBonuses {
    fn default() -> Self {
        Self {
            return_visitor_multiplier: default_return_visitor_multiplier(),
            identified_lead_bonus: default_identified_lead_bonus(),
            recency_tiers: default_recency_tiers(),
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hot: default_hot_threshold(),
            warm: default_warm_threshold(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            behavioral: BehavioralWeights::default(),
            engagement: EngagementBonuses::default(),
            thresholds: TierThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// Returns a fresh config with `overrides` applied on top of `self`.
    /// Fields the override leaves unset keep their current value.
    pub fn merge(&self, overrides: &ScoringOverrides) -> ScoringConfig {
        let mut merged = self.clone();
        let b = &overrides.behavioral;
        if let Some(v) = b.page_view {
            merged.behavioral.page_view = v;
        }
        if let Some(v) = b.session {
            merged.behavioral.session = v;
        }
        if let Some(v) = b.minute_on_site {
            merged.behavioral.minute_on_site = v;
        }
        if let Some(v) = b.minutes_cap {
            merged.behavioral.minutes_cap = v;
        }
        if let Some(v) = b.click {
            merged.behavioral.click = v;
        }
        if let Some(v) = b.form_submit {
            merged.behavioral.form_submit = v;
        }
        if let Some(v) = b.scroll {
            merged.behavioral.scroll = v;
        }
        if let Some(v) = b.download {
            merged.behavioral.download = v;
        }
        if let Some(v) = b.video_watch {
            merged.behavioral.video_watch = v;
        }
        let e = &overrides.engagement;
        if let Some(v) = e.return_visitor_multiplier {
            merged.engagement.return_visitor_multiplier = v;
        }
        if let Some(v) = e.identified_lead_bonus {
            merged.engagement.identified_lead_bonus = v;
        }
        if let Some(v) = &e.recency_tiers {
            merged.engagement.recency_tiers = v.clone();
        }
        let t = &overrides.thresholds;
        if let Some(v) = t.hot {
            merged.thresholds.hot = v;
        }
        if let Some(v) = t.warm {
            merged.thresholds.warm = v;
        }
        merged
    }
}

/// Partial override of [`ScoringConfig`]; every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringOverrides {
    #[serde(default)]
    pub behavioral: BehavioralOverrides,
    #[serde(default)]
    pub engagement: EngagementOverrides,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehavioralOverrides {
    pub page_view: Option<f64>,
    pub session: Option<f64>,
    pub minute_on_site: Option<f64>,
    pub minutes_cap: Option<f64>,
    pub click: Option<f64>,
    pub form_submit: Option<f64>,
    pub scroll: Option<f64>,
    pub download: Option<f64>,
    pub video_watch: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementOverrides {
    pub return_visitor_multiplier: Option<f64>,
    pub identified_lead_bonus: Option<f64>,
    pub recency_tiers: Option<Vec<RecencyTier>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub hot: Option<f64>,
    pub warm: Option<f64>,
}

// Default functions
fn default_page_view_weight() -> f64 {
    1.0
}
fn default_session_weight() -> f64 {
    5.0
}
fn default_minute_weight() -> f64 {
    0.5
}
fn default_minutes_cap() -> f64 {
    120.0
}
fn default_click_weight() -> f64 {
    0.5
}
fn default_form_submit_weight() -> f64 {
    15.0
}
fn default_scroll_weight() -> f64 {
    0.2
}
fn default_download_weight() -> f64 {
    5.0
}
fn default_video_watch_weight() -> f64 {
    3.0
}
fn default_return_visitor_multiplier() -> f64 {
    2.0
}
fn default_identified_lead_bonus() -> f64 {
    20.0
}
fn default_recency_tiers() -> Vec<RecencyTier> {
    vec![
        RecencyTier {
            max_age_hours: 24,
            bonus: 15.0,
        },
        RecencyTier {
            max_age_hours: 24 * 7,
            bonus: 10.0,
        },
        RecencyTier {
            max_age_hours: 24 * 30,
            bonus: 5.0,
        },
    ]
}
fn default_hot_threshold() -> f64 {
    70.0
}
fn default_warm_threshold() -> f64 {
    30.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields_at_defaults() {
        let base = ScoringConfig::default();
        let overrides = ScoringOverrides {
            behavioral: BehavioralOverrides {
                form_submit: Some(25.0),
                ..Default::default()
            },
            thresholds: ThresholdOverrides {
                hot: Some(100.0),
                warm: None,
            },
            ..Default::default()
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.behavioral.form_submit, 25.0);
        assert_eq!(merged.behavioral.page_view, base.behavioral.page_view);
        assert_eq!(merged.thresholds.hot, 100.0);
        assert_eq!(merged.thresholds.warm, base.thresholds.warm);
        // The baseline is untouched.
        assert_eq!(base.behavioral.form_submit, 15.0);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"behavioral": {"click": 2.0}}"#).unwrap();
        assert_eq!(config.behavioral.click, 2.0);
        assert_eq!(config.behavioral.session, 5.0);
        assert_eq!(config.thresholds.warm, 30.0);
        assert_eq!(config.engagement.recency_tiers.len(), 3);
    }

    #[test]
    fn test_default_recency_tiers_ordered_tightest_first() {
        let tiers = EngagementBonuses::default().recency_tiers;
        for pair in tiers.windows(2) {
            assert!(pair[0].max_age_hours < pair[1].max_age_hours);
            assert!(pair[0].bonus > pair[1].bonus);
        }
    }
}
