//! Cross-cutting dimension histograms for dashboard breakdowns.

use std::collections::HashMap;

use leadscope_core::types::{Session, Visitor};
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "unknown";

/// Histograms over session and visitor dimensions. Absent values bucket
/// under `"unknown"` so the totals still add up to the input size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub browsers: HashMap<String, u64>,
    pub operating_systems: HashMap<String, u64>,
    pub devices: HashMap<String, u64>,
    pub countries: HashMap<String, u64>,
}

pub fn dimension_breakdown(sessions: &[Session], visitors: &[Visitor]) -> DimensionBreakdown {
    let mut breakdown = DimensionBreakdown::default();
    for session in sessions {
        bump(&mut breakdown.browsers, session.browser.as_deref());
        bump(&mut breakdown.operating_systems, session.os.as_deref());
        bump(&mut breakdown.devices, session.device.as_deref());
    }
    for visitor in visitors {
        bump(&mut breakdown.countries, visitor.country.as_deref());
    }
    breakdown
}

fn bump(histogram: &mut HashMap<String, u64>, value: Option<&str>) {
    let key = value.unwrap_or(UNKNOWN);
    *histogram.entry(key.to_string()).or_insert(0) += 1;
}
