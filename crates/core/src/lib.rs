pub mod config;
pub mod error;
pub mod types;

pub use config::{ScoringConfig, ScoringOverrides};
pub use error::{LeadScopeError, LeadScopeResult};
