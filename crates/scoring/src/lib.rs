//! Lead scoring: classifies raw behavioral events and turns a visitor's
//! activity into a numeric score with a Hot/Warm/Cold tier.

pub mod batch;
pub mod classifier;
pub mod engine;

pub use batch::score_concurrently;
pub use classifier::{classify, EventClass, EventCounts};
pub use engine::{LeadQuality, LeadScoreResult, ScoreBreakdown, ScoringEngine};
