//! Dashboard analytics: daily rollups over a trailing window, cross-sectional
//! stats, and dimension histograms.

pub mod dimensions;
pub mod rollup;

pub use dimensions::{dimension_breakdown, DimensionBreakdown};
pub use rollup::{daily_rollup, stats, DailyBucket, DailyRollup, StatsSummary};
